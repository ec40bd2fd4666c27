//! CLI 모듈
//!
//! chatvet CLI 명령어 정의 및 구현

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::auth::UserDirectory;
use crate::chatbot::Chatbot;
use crate::config::{self, Config};
use crate::embedding::OpenAiEmbedding;
use crate::ingest::{self, IngestOptions, RetryPolicy};
use crate::knowledge::{ChunkConfig, PineconeIndex, VectorIndex};
use crate::server::{self, AppState};
use crate::symptom::{SymptomChecker, DEFAULT_THRESHOLD, DEFAULT_TOP_K, NO_MATCH_MESSAGE};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "chatvet")]
#[command(version, about = "ChatVet - AI 반려동물 건강 상담 챗봇", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 웹 채팅 서버 실행
    Serve {
        /// 바인드 주소
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// 포트
        #[arg(short, long, default_value = "8501")]
        port: u16,
    },

    /// PDF 가이드와 증상 CSV를 벡터 인덱스에 적재
    Ingest {
        /// PDF 폴더 (기본: CHATVET_PDF_DIR)
        #[arg(long)]
        pdf_dir: Option<PathBuf>,

        /// CSV 파일 (기본: CHATVET_SYMPTOM_CSV)
        #[arg(long)]
        csv: Option<PathBuf>,

        /// 청크 당 최대 단어 수
        #[arg(long, default_value = "500")]
        max_words: usize,

        /// 청크 간 중첩 단어 수
        #[arg(long, default_value = "50")]
        overlap: usize,

        /// 청킹까지만 수행 (임베딩/업로드 없음)
        #[arg(long)]
        dry_run: bool,
    },

    /// 챗봇에 질문 한 번 하기
    Ask {
        /// 질문
        question: String,
    },

    /// 증상 CSV 매칭만 수행 (API 호출 없음)
    Check {
        /// 증상 설명
        symptoms: String,

        /// 최소 유사도
        #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f32,
    },

    /// 설정 및 인덱스 상태 확인
    Status,
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve { host, port } => cmd_serve(&host, port).await,
        Commands::Ingest {
            pdf_dir,
            csv,
            max_words,
            overlap,
            dry_run,
        } => cmd_ingest(pdf_dir, csv, max_words, overlap, dry_run).await,
        Commands::Ask { question } => cmd_ask(&question).await,
        Commands::Check {
            symptoms,
            threshold,
        } => cmd_check(&symptoms, threshold),
        Commands::Status => cmd_status().await,
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 웹 서버 (serve)
async fn cmd_serve(host: &str, port: u16) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("잘못된 주소: {}:{}", host, port))?;

    let config = Config::from_env()?;
    let chatbot = Chatbot::from_config(&config)
        .await
        .context("챗봇 초기화 실패")?;

    println!("[*] ChatVet 서버 시작: http://{}", addr);

    let state = Arc::new(AppState::new(Arc::new(chatbot), UserDirectory::demo()));
    server::serve(state, addr).await
}

/// 인제스트 (ingest)
async fn cmd_ingest(
    pdf_dir: Option<PathBuf>,
    csv: Option<PathBuf>,
    max_words: usize,
    overlap: usize,
    dry_run: bool,
) -> Result<()> {
    let options = IngestOptions {
        pdf_dir: Some(pdf_dir.unwrap_or_else(config::pdf_dir_path)),
        csv_file: Some(csv.unwrap_or_else(config::symptom_csv_path)),
        csv_columns: None,
        chunk: ChunkConfig::new(max_words, overlap)?,
        retry: RetryPolicy::default(),
    };

    for path in options.pdf_dir.iter().chain(options.csv_file.iter()) {
        if !path.exists() {
            bail!("경로가 존재하지 않습니다: {}", path.display());
        }
    }

    if dry_run {
        let (chunks, report) = ingest::preprocess(&options)?;
        println!("[OK] 청킹 완료 (dry-run)");
        println!(
            "     PDF 청크: {}, CSV 청크: {}",
            report.pdf_chunks, report.csv_chunks
        );
        if let Some(first) = chunks.first() {
            println!("     첫 청크 [{}]: {}", first.source, truncate_text(&first.text, 80));
        }
        return Ok(());
    }

    let config = Config::from_env()?;
    let embedder = OpenAiEmbedding::new(&config.openai)?;
    let index = PineconeIndex::connect(&config.pinecone)
        .await
        .context("Pinecone 인덱스 연결 실패")?;

    println!("[*] 임베딩 생성 및 업로드 중...");
    let report = ingest::run(&options, &embedder, &index).await?;

    println!("[OK] 인제스트 완료");
    println!(
        "     청크: {} (PDF {}, CSV {}), 업로드: {}",
        report.total_chunks(),
        report.pdf_chunks,
        report.csv_chunks,
        report.upserted
    );

    Ok(())
}

/// 단일 질문 (ask)
async fn cmd_ask(question: &str) -> Result<()> {
    let config = Config::from_env()?;
    let chatbot = Chatbot::from_config(&config)
        .await
        .context("챗봇 초기화 실패")?;

    println!("{}", chatbot.ask(question).await);
    Ok(())
}

/// 증상 매칭 (check)
fn cmd_check(symptoms: &str, threshold: f32) -> Result<()> {
    let path = config::symptom_csv_path();
    let checker = SymptomChecker::from_csv(&path, "symptom", "suggestion")
        .with_context(|| format!("증상 CSV 로드 실패: {}", path.display()))?;

    let matches = checker.find_closest(symptoms, DEFAULT_TOP_K);
    let hits: Vec<_> = matches.iter().filter(|m| m.score >= threshold).collect();

    if hits.is_empty() {
        println!("{}", NO_MATCH_MESSAGE);
        return Ok(());
    }

    for (i, m) in hits.iter().enumerate() {
        println!("[{}] {} (score: {:.3})", i + 1, m.symptom, m.score);
        println!("    {}", m.suggestion);
    }

    Ok(())
}

/// 상태 확인 (status)
async fn cmd_status() -> Result<()> {
    println!("chatvet v{}", env!("CARGO_PKG_VERSION"));
    println!();

    let missing = config::missing_required_vars();
    if missing.is_empty() {
        println!("[OK] API 키: 설정됨");
    } else {
        for name in &missing {
            println!("[!] {}: 미설정", name);
        }
    }

    // 증상 CSV
    let csv_path = config::symptom_csv_path();
    match SymptomChecker::from_csv(&csv_path, "symptom", "suggestion") {
        Ok(checker) => println!("[OK] 증상 CSV: {} 건 ({})", checker.len(), csv_path.display()),
        Err(e) => println!("[!] 증상 CSV 로드 실패: {:#}", e),
    }

    // PDF 폴더
    let pdf_dir = config::pdf_dir_path();
    match ingest::list_pdfs(&pdf_dir) {
        Ok(files) => println!("[OK] PDF 가이드: {} 개 ({})", files.len(), pdf_dir.display()),
        Err(e) => println!("[!] PDF 폴더 확인 실패: {:#}", e),
    }

    // 벡터 인덱스 (키가 있을 때만)
    if missing.is_empty() {
        let config = Config::from_env()?;
        match PineconeIndex::connect(&config.pinecone).await {
            Ok(index) => match index.count().await {
                Ok(count) => println!("[OK] 벡터 인덱스: {} 벡터", count),
                Err(e) => tracing::debug!("벡터 통계 조회 실패: {:#}", e),
            },
            Err(e) => println!("[!] Pinecone 연결 실패: {:#}", e),
        }
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}
