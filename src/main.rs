mod config;
mod crawler;
mod export;
mod parser;
mod pipeline;
mod storage;
mod summarizer;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use config::{AppConfig, BatchConfig};
use crawler::{build_client, RemoteSources, SemanticScholarClient};
use export::{render_json, Exporter};
use parser::PdfParser;
use pipeline::{FileOptions, Pipeline};
use storage::{Database, RecordQuery};
use summarizer::{ChatClient, Summarizer};
use utils::logger;

#[derive(Parser)]
#[command(name = "papersum")]
#[command(about = "论文章节提取与通俗摘要工具", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 初始化配置和数据库
    Init,
    /// 按 DOI 下载开放获取PDF并生成摘要（不指定则使用 config/dois.toml）
    Summarize {
        dois: Vec<String>,
    },
    /// 摘要本地PDF文件
    File {
        path: PathBuf,
        /// 论文 DOI，提供时作为标识符并查询元数据
        #[arg(long)]
        doi: Option<String>,
        /// 只导出文件，不写入数据库
        #[arg(long)]
        no_store: bool,
    },
    /// 在 Semantic Scholar 上检索论文
    Search {
        query: String,
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },
    /// 按年份、期刊、关键词筛选已保存的摘要
    Query {
        #[arg(short, long)]
        keyword: Option<String>,
        #[arg(short, long)]
        year: Option<i32>,
        #[arg(short, long)]
        journal: Option<String>,
    },
    /// 显示一篇论文的章节摘要
    Show {
        id: String,
        /// 输出完整 JSON
        #[arg(long)]
        json: bool,
    },
    /// 列出可用于筛选的年份和期刊
    Facets,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logger::init_logger();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => init_command().await?,
        Commands::Summarize { dois } => summarize_command(dois).await?,
        Commands::File { path, doi, no_store } => file_command(&path, doi, no_store).await?,
        Commands::Search { query, limit } => search_command(&query, limit).await?,
        Commands::Query {
            keyword,
            year,
            journal,
        } => {
            query_command(RecordQuery {
                keyword,
                year,
                journal,
            })
            .await?
        }
        Commands::Show { id, json } => show_command(&id, json).await?,
        Commands::Facets => facets_command().await?,
    }

    Ok(())
}

async fn init_command() -> Result<()> {
    info!("初始化系统...");

    let app_config = AppConfig::load()?;
    tokio::fs::create_dir_all("config").await?;
    tokio::fs::create_dir_all(app_config.storage.output_dir()).await?;
    tokio::fs::create_dir_all(app_config.storage.temp_dir()).await?;

    // 已有配置不覆盖，避免冲掉 API key
    if !Path::new(config::SETTINGS_PATH).exists() {
        AppConfig::default().save(config::SETTINGS_PATH)?;
        info!("已生成配置文件: {}", config::SETTINGS_PATH);
    }
    if !Path::new(config::batch::BATCH_PATH).exists() {
        let batch_toml = toml::to_string_pretty(&BatchConfig::default())?;
        tokio::fs::write(config::batch::BATCH_PATH, batch_toml).await?;
        info!("已生成 DOI 列表: {}", config::batch::BATCH_PATH);
    }

    let db = Database::connect(&app_config.storage.database_path()).await?;
    db.close().await;
    info!("数据库初始化完成: {}", app_config.storage.database_path);

    info!("✅ 系统初始化完成！");
    info!("下一步:");
    info!("  1. 编辑 {} 配置 API key 和联系邮箱", config::SETTINGS_PATH);
    info!("  2. 运行 'papersum summarize <DOI>' 生成摘要");

    Ok(())
}

fn build_pipeline(app_config: &AppConfig, db: Database) -> Result<Pipeline> {
    let sources = RemoteSources::new(&app_config.fetch)?;
    let generator = ChatClient::new(app_config.summarizer.clone())?;
    let summarizer = Summarizer::new(Box::new(generator), &app_config.summarizer);
    let exporter = Exporter::new(app_config.storage.output_dir());
    info!("导出目录: {}", exporter.output_dir().display());

    Ok(Pipeline::new(
        Box::new(sources),
        Box::new(PdfParser::new()),
        summarizer,
        exporter,
        db,
        app_config.storage.temp_dir(),
    ))
}

async fn summarize_command(dois: Vec<String>) -> Result<()> {
    let app_config = AppConfig::load()?;
    if !app_config.summarizer.is_configured() {
        info!("❌ API key 未配置。请在 {} 中设置 [summarizer] api_key 或设置 OPENAI_API_KEY", config::SETTINGS_PATH);
        return Ok(());
    }

    let dois: Vec<String> = if dois.is_empty() {
        let batch = BatchConfig::load()?;
        batch.active_dois().into_iter().map(str::to_string).collect()
    } else {
        dois
    };

    if dois.is_empty() {
        info!("没有需要处理的 DOI");
        return Ok(());
    }

    let db = Database::connect(&app_config.storage.database_path()).await?;
    let pipeline = build_pipeline(&app_config, db.clone())?;

    let mut success_count = 0;
    let mut fail_count = 0;

    for doi in &dois {
        match pipeline.summarize_doi(doi.trim()).await {
            Ok(record) => {
                info!("  ✅ {} ({} 个章节)", doi, record.summaries.len());
                success_count += 1;
            }
            Err(e) => {
                error!("  ❌ {}: {}", doi, e);
                fail_count += 1;
            }
        }
    }

    db.close().await;
    info!("✅ 摘要完成: {} 成功, {} 失败", success_count, fail_count);
    Ok(())
}

async fn file_command(path: &Path, doi: Option<String>, no_store: bool) -> Result<()> {
    let app_config = AppConfig::load()?;
    if !app_config.summarizer.is_configured() {
        info!("❌ API key 未配置。请在 {} 中设置 [summarizer] api_key 或设置 OPENAI_API_KEY", config::SETTINGS_PATH);
        return Ok(());
    }

    let identifier = match &doi {
        Some(doi) => doi.trim().to_string(),
        None => path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string()),
    };
    let options = FileOptions {
        identifier,
        lookup_metadata: doi.is_some(),
        persist: !no_store,
    };

    let db = Database::connect(&app_config.storage.database_path()).await?;
    let pipeline = build_pipeline(&app_config, db.clone())?;
    let result = pipeline.summarize_file(path, &options).await;
    db.close().await;

    let record = result?;
    if options.persist {
        info!("✅ 已摘要并保存: {}", record.identifier);
    } else {
        info!("✅ 已摘要并导出（未写入数据库）: {}", record.identifier);
    }
    Ok(())
}

async fn search_command(query: &str, limit: usize) -> Result<()> {
    let app_config = AppConfig::load()?;
    let client = build_client(&app_config.fetch)?;
    let scholar = SemanticScholarClient::new(client, &app_config.fetch);

    let hits = scholar.search(query, limit).await?;
    if hits.is_empty() {
        info!("未找到匹配的论文");
        return Ok(());
    }

    for hit in &hits {
        println!("---");
        println!("标题: {}", hit.title.as_deref().unwrap_or("(无标题)"));
        println!("作者: {}", hit.authors.join(", "));
        if let Some(year) = hit.year {
            println!("年份: {}", year);
        }
        println!("DOI: {}", hit.doi.as_deref().unwrap_or("-"));
        if let Some(url) = &hit.pdf_url {
            println!("PDF: {}", url);
        }
        if let Some(abs) = &hit.abstract_text {
            let preview: String = abs.chars().take(200).collect();
            println!("摘要: {}...", preview);
        }
    }
    Ok(())
}

async fn query_command(filter: RecordQuery) -> Result<()> {
    let app_config = AppConfig::load()?;
    let db = Database::connect(&app_config.storage.database_path()).await?;
    let records = db.query(&filter).await;
    db.close().await;
    let records = records?;

    if records.is_empty() {
        info!("没有符合条件的摘要");
        return Ok(());
    }

    for record in &records {
        println!(
            "{}\t{}\t{}\t{}",
            record.identifier,
            record.year.map(|y| y.to_string()).unwrap_or_else(|| "-".to_string()),
            record.journal.as_deref().unwrap_or("-"),
            record.title.as_deref().unwrap_or("(无标题)"),
        );
    }
    info!("共 {} 条记录", records.len());
    Ok(())
}

async fn show_command(id: &str, json: bool) -> Result<()> {
    let app_config = AppConfig::load()?;
    let db = Database::connect(&app_config.storage.database_path()).await?;
    let record = db.get(id).await;
    db.close().await;

    let Some(record) = record? else {
        warn!("未找到记录: {}", id);
        return Ok(());
    };

    if json {
        println!("{}", render_json(&record)?);
        return Ok(());
    }

    println!("DOI: {}", record.identifier);
    println!("标题: {}", record.title.as_deref().unwrap_or("N/A"));
    println!(
        "年份: {} | 期刊: {}",
        record.year.map(|y| y.to_string()).unwrap_or_else(|| "N/A".to_string()),
        record.journal.as_deref().unwrap_or("N/A")
    );
    if !record.authors.is_empty() {
        println!("作者: {}", record.authors.join(", "));
    }
    println!("生成时间: {}", record.generated_at.to_rfc3339());
    for (label, summary) in &record.summaries {
        println!("\n--- {} ---\n{}", label.as_str().to_uppercase(), summary);
    }
    Ok(())
}

async fn facets_command() -> Result<()> {
    let app_config = AppConfig::load()?;
    let db = Database::connect(&app_config.storage.database_path()).await?;
    let years = db.distinct_years().await;
    let journals = db.distinct_journals().await;
    db.close().await;

    let years: Vec<String> = years?.iter().map(|y| y.to_string()).collect();
    println!("年份: {}", years.join(", "));
    println!("期刊: {}", journals?.join(", "));
    Ok(())
}
