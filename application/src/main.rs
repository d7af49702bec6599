use std::{io, process::ExitCode, rc::Rc, sync::OnceLock};

use application::{
    render, Action, Args, AsError as _, Board, Config, Form, Service,
};
use service::{
    infra::{cache, Rest},
    read::opportunity::list,
};
use tracing as log;
use tracing_subscriber::{
    filter::filter_fn,
    layer::{Layer as _, SubscriberExt as _},
    util::SubscriberInitExt as _,
};

const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_writer(io::stdout)
                .with_filter(filter_fn(|meta| {
                    meta.is_span()
                        || (!STDERR_LEVELS.contains(meta.level()))
                            && LOG_LEVEL
                                .get()
                                .copied()
                                .unwrap_or(log::Level::INFO)
                                >= *meta.level()
                })),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_writer(io::stderr)
                .with_filter(filter_fn(|meta| {
                    meta.is_span()
                        || (STDERR_LEVELS.contains(meta.level()))
                            && LOG_LEVEL
                                .get()
                                .copied()
                                .unwrap_or(log::Level::INFO)
                                >= *meta.level()
                })),
        )
        .init();

    match start().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(()) => ExitCode::FAILURE,
    }
}

async fn start() -> Result<(), ()> {
    let Args { config, action } = Args::parse().map_err(|e| {
        if e.use_stderr() {
            log::error!("failed to parse command line arguments: {e}");
        } else {
            _ = e.print();
        }
    })?;

    let Config {
        record_store,
        service,
        log,
    } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    LOG_LEVEL
        .set(log.level.into())
        .unwrap_or_else(|_| unreachable!("first initialization"));

    let service_config = service.try_into().map_err(|e| {
        log::error!("invalid `service` configuration: {e}");
    })?;
    let rest = Rest::new(&record_store.into()).map_err(|e| {
        log::error!("failed to initialize `Rest` client: {}", e.as_error());
    })?;
    let service = Service::new(service_config, rest);
    let cache = Rc::new(cache::Memory::default());

    let mut out = io::stdout().lock();
    let printed = match action {
        Action::Board => {
            let board = Board::new(service, cache);
            refresh(&board).await?;
            render::board(&mut out, &board.columns())
        }
        Action::Move { id, stage } => {
            let board = Board::new(service, cache);
            refresh(&board).await?;
            let moved = board.move_item(id, stage).await;
            let printed = render::board(&mut out, &board.columns());
            let moved = moved.map_err(|e| {
                log::error!(
                    "failed to move `Opportunity({id})`: {}",
                    e.as_error(),
                );
            })?;
            printed.and_then(|()| render::moved(&mut out, id, moved))
        }
        Action::Show { id } => {
            let form = Form::new(service, cache);
            form.load(id).await.map_err(|e| {
                log::error!(
                    "failed to load `Opportunity({id})`: {}",
                    e.as_error(),
                );
            })?;
            render::draft(&mut out, &form.draft())
        }
    };

    printed.map_err(|e| log::error!("failed to print: {e}"))
}

/// Loads the whole pipeline onto the provided [`Board`].
async fn refresh(board: &Board) -> Result<(), ()> {
    board.refresh(list::Selector::default()).await.map_err(|e| {
        log::error!("failed to load the pipeline: {}", e.as_error());
    })
}
