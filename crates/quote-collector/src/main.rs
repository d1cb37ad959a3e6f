//! KRX 현재가 수집기 CLI.

use anyhow::Context;
use clap::{Parser, Subcommand};
use quote_collector::modules::{format_quote, lookup_quote};
use quote_collector::{AppContext, CollectorConfig, CycleOutcome};
use quote_core::{init_logging, LogConfig, Symbol, SymbolSource};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "quote-collector")]
#[command(about = "KRX intraday quote collector", long_about = None)]
#[command(version)]
struct Cli {
    /// 생략하면 데몬 모드로 실행
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// 데몬 모드: 장중 cron 일정으로 수집 (종료 신호까지 실행)
    Daemon,

    /// 수집 주기 한 번 실행
    Once {
        /// 장 운영 시간이 아니어도 실행
        #[arg(long)]
        force: bool,
    },

    /// 종목 하나의 현재가 조회
    Quote {
        /// 종목코드 (예: 005930)
        code: String,
        /// 종목명 (생략하면 종목 목록에서 찾음)
        name: Option<String>,
    },

    /// 종목 목록 관리
    Symbols {
        #[command(subcommand)]
        action: SymbolAction,
    },
}

#[derive(Subcommand)]
enum SymbolAction {
    /// 전체 목록 출력
    List,
    /// 종목코드로 찾기
    Find { code: String },
    /// 종목 추가 (같은 코드가 있으면 이름 갱신)
    Add { code: String, name: String },
    /// 종목 제거
    Remove { code: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // .env 로드 후 로깅 초기화 (RUST_LOG, LOG_FORMAT이 .env에 있을 수 있음)
    quote_collector::config::load_env_files();
    init_logging(LogConfig::from_env()).map_err(|e| anyhow::anyhow!(e))?;

    let config = CollectorConfig::from_env().context("설정 로드 실패")?;
    let ctx = AppContext::new(config);

    match cli.command.unwrap_or(Commands::Daemon) {
        Commands::Daemon => run_daemon(&ctx).await?,
        Commands::Once { force } => {
            let scheduler = ctx.poll_scheduler()?;
            let outcome = if force {
                scheduler.run_now().await
            } else {
                scheduler.fire().await
            };
            if let CycleOutcome::Failed(reason) = outcome {
                anyhow::bail!("수집 주기 실패: {}", reason);
            }
        }
        Commands::Quote { code, name } => {
            let name = match name {
                Some(name) => name,
                None => ctx
                    .symbols
                    .find_by_code(&code)
                    .await?
                    .map(|s| s.name)
                    .unwrap_or_default(),
            };
            let symbol = Symbol::new(code, name);
            let client = ctx.quote_client()?;

            match lookup_quote(client.as_ref(), &symbol).await? {
                Some(quote) => println!("{}", format_quote(&quote)),
                None => anyhow::bail!("{} 시세를 가져오지 못했습니다", symbol.code),
            }
        }
        Commands::Symbols { action } => match action {
            SymbolAction::List => {
                let symbols = ctx.symbols.load().await?;
                for symbol in &symbols {
                    println!("{}\t{}", symbol.code, symbol.name);
                }
                info!(count = symbols.len(), "종목 목록 출력");
            }
            SymbolAction::Find { code } => match ctx.symbols.find_by_code(&code).await? {
                Some(symbol) => println!("{}\t{}", symbol.code, symbol.name),
                None => anyhow::bail!("{} 종목이 목록에 없습니다", code),
            },
            SymbolAction::Add { code, name } => {
                ctx.symbols.upsert(Symbol::new(code, name)).await?;
            }
            SymbolAction::Remove { code } => {
                if !ctx.symbols.remove(&code).await? {
                    warn!(code = %code, "목록에 없는 종목");
                }
            }
        },
    }

    Ok(())
}

async fn run_daemon(ctx: &AppContext) -> anyhow::Result<()> {
    let cron = ctx.config.poll.cron_expression();
    info!(
        cron = %cron,
        delay_ms = ctx.config.poll.request_delay_ms,
        "=== 데몬 모드 시작 ==="
    );

    let scheduler = ctx.poll_scheduler()?;
    let mut jobs = scheduler.start(&cron).await?;

    shutdown_signal().await?;

    jobs.shutdown().await?;
    info!("수집기 종료");
    Ok(())
}

async fn shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        let mut terminate =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .context("SIGTERM 핸들러 설치 실패")?;

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("Ctrl+C 핸들러 설치 실패")?;
                warn!("Received Ctrl+C, shutting down...");
            }
            _ = terminate.recv() => {
                warn!("Received SIGTERM, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .context("Ctrl+C 핸들러 설치 실패")?;
        warn!("Received Ctrl+C, shutting down...");
    }

    Ok(())
}
