use std::{process, sync::Arc};

use taggable::{
    QueryExecutor, SaveOutcome, TaggingContext, TaggingEngine,
    application::aggregate::{sort_by_name, with_min_count},
    application::error::{AppError, error_chain},
    cache::{CacheRegistry, MemoryCache},
    config::{self, Command, MEMORY_CACHE_ID, Settings},
    domain::entity::EntityRef,
    infra::{error::InfraError, sqlite::SqliteExecutor, telemetry},
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

fn main() {
    if let Err(error) = run() {
        report_application_error(&error);
        process::exit(error.exit_code());
    }
}

fn report_application_error(error: &AppError) {
    let chain = error_chain(error);
    if dispatcher::has_been_set() {
        error!(error = %error, chain = ?chain, "application error");
    } else {
        let subscriber = tracing_fmt()
            .with_max_level(Level::ERROR)
            .with_writer(std::io::stderr)
            .finish();
        let dispatch = Dispatch::new(subscriber);
        dispatcher::with_default(&dispatch, || {
            error!(error = %error, chain = ?chain, "application error");
        });
    }
}

fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli().map_err(InfraError::from)?;

    telemetry::init(&settings.logging)?;

    let schema = settings.tagging.schema()?;
    let db = Arc::new(SqliteExecutor::connect(&settings.database.url)?);

    let registry = CacheRegistry::new();
    if settings.cache.enabled {
        let memory = Arc::new(MemoryCache::new(&settings.cache));
        registry.register(MEMORY_CACHE_ID, memory);
    }
    let cache = registry.resolve(schema.cache_id());

    let ctx = TaggingContext::new(schema, db.clone(), cache);
    info!(
        entity_table = ctx.schema().entity_table(),
        database = %settings.database.url,
        "Tagging context ready"
    );

    let lines = db.transaction(|tx| run_command(&ctx, tx, &settings, cli_args.command))?;
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

fn run_command(
    ctx: &TaggingContext,
    tx: &SqliteExecutor,
    settings: &Settings,
    command: Command,
) -> Result<Vec<String>, AppError> {
    let table = settings.tagging.entity_table.as_str();

    let lines = match command {
        Command::Show(args) => {
            let mut engine = ctx.engine(EntityRef::stored(table, args.id));
            vec![engine.tags_display()?]
        }
        Command::Set(args) => {
            let mut engine = ctx.engine(entity_for(table, args.id, args.new_record));
            engine.set_tag_list(&args.tags);
            saved_lines(&mut engine)?
        }
        Command::Add(args) => {
            let mut engine = ctx.engine(entity_for(table, args.id, args.new_record));
            engine.add_tag_list(&args.tags)?;
            saved_lines(&mut engine)?
        }
        Command::Remove(args) => {
            let mut engine = ctx.engine(entity_for(table, args.id, args.new_record));
            engine.remove_tag_list(&args.tags)?;
            saved_lines(&mut engine)?
        }
        Command::Clear(args) => {
            let mut engine = ctx.engine(EntityRef::stored(table, args.id));
            engine.remove_all_tags()?;
            saved_lines(&mut engine)?
        }
        Command::Delete(args) => {
            ctx.engine(EntityRef::stored(table, args.id)).delete()?;
            Vec::new()
        }
        Command::All => ctx.reader().all_tags()?,
        Command::Counts(args) => {
            let mut counts = with_min_count(ctx.reader().all_tags_with_count()?, args.min);
            sort_by_name(&mut counts);
            counts
                .into_iter()
                .map(|tag| format!("{}\t{}", tag.name, tag.count))
                .collect()
        }
        Command::Find(args) => {
            let criteria = ctx.query_builder().build_filter_from_list(&args.tags);
            tx.column(&criteria.select_ids())?
                .into_iter()
                .filter_map(|value| value.into_text())
                .collect()
        }
    };

    Ok(lines)
}

fn entity_for(table: &str, id: i64, new_record: bool) -> EntityRef {
    if new_record {
        EntityRef::inserted(table, id)
    } else {
        EntityRef::stored(table, id)
    }
}

fn saved_lines(engine: &mut TaggingEngine<EntityRef>) -> Result<Vec<String>, AppError> {
    let outcome = engine.save()?;
    let tags = engine.tags_display()?;
    Ok(vec![match outcome {
        SaveOutcome::Written => tags,
        SaveOutcome::Skipped => format!("{tags} (unchanged)"),
    }])
}
