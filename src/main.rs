use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use report_cleaner::core::pdf::extract_text;
use report_cleaner::{
    pipeline, EmailSender, PipelineConfig, RemovalMode, ReportError, Settings, Summarizer,
    WatermarkSpec,
};

/// 去除研报 PDF 水印，生成 AI 中文摘要并通过邮件分发
#[derive(Parser)]
#[command(name = "report-cleaner", version)]
struct Args {
    /// 输入 PDF 文件
    input: PathBuf,

    /// 输出 PDF 路径（默认：<输入名>_clean.pdf）
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 要移除的水印文本，可多次指定（默认使用内置水印清单）
    #[arg(short = 'w', long = "watermark")]
    watermarks: Vec<String>,

    /// 文本模式未命中时，对内嵌图片运行水印覆盖启发式
    #[arg(long)]
    image_mode: bool,

    /// 生成结构化 AI 中文摘要
    #[arg(long)]
    summarize: bool,

    /// 收件人邮箱；指定后发送邮件（PDF 附件 + HTML 摘要）
    #[arg(short, long)]
    recipient: Option<String>,

    /// 使用配置文件中的默认收件人发送邮件
    #[arg(long, conflicts_with = "recipient")]
    send: bool,

    /// 额外输出微信分享格式摘要到终端
    #[arg(long)]
    wechat: bool,

    /// 配置文件路径（默认：~/.config/report-cleaner/settings.json）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 仅测试 SMTP 连接后退出
    #[arg(long)]
    test_smtp: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("错误: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), ReportError> {
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(Settings::default_path);
    let settings = Settings::load(&config_path)?;

    if args.test_smtp {
        let sender = EmailSender::new(settings.smtp.clone());
        sender.test_connection()?;
        println!("SMTP 连接测试成功: {}", settings.smtp.host);
        return Ok(());
    }

    let mut watermark = if args.watermarks.is_empty() {
        WatermarkSpec::builtin()
    } else {
        WatermarkSpec {
            patterns: args.watermarks.clone(),
            mode: RemovalMode::TextOnly,
        }
    };
    if args.image_mode {
        watermark = watermark.with_mode(RemovalMode::TextThenImage);
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PipelineConfig::default_output_for(&args.input));

    let recipient = if args.send {
        Some(settings.default_recipient.clone())
    } else {
        args.recipient.clone()
    };

    let config = PipelineConfig {
        input: args.input.clone(),
        output,
        watermark,
        recipient,
        summarize: args.summarize,
    };

    println!("[1/3] 正在移除水印: {}", config.input.display());
    let report = pipeline::run(&config, &settings)?;

    if report.removal.nothing_found() {
        println!("      未在文档中找到水印（输出内容与输入一致）");
    } else {
        println!(
            "      已删除 {} 处水印（{} 页受影响）",
            report.removal.occurrences_removed, report.removal.pages_modified
        );
    }
    println!("[2/3] 清洁 PDF 已保存: {}", report.output.display());

    if let Some(summary) = &report.summary {
        let origin = match &summary.source {
            report_cleaner::SummarySource::Ai { provider } => provider.as_str(),
            report_cleaner::SummarySource::Fallback => "本地兜底",
        };
        println!("      AI 摘要来源: {}", origin);
        for (title, items) in summary.sections() {
            if items.is_empty() {
                continue;
            }
            println!("  ## {}", title);
            for item in items {
                println!("  - {}", item);
            }
        }
    }

    if report.email_sent {
        println!("[3/3] 邮件已发送: {}", config.recipient.as_deref().unwrap_or(""));
    } else {
        println!("[3/3] 未发送邮件");
    }

    if args.wechat {
        let filename = config
            .input
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("report.pdf");
        let text = extract_text(&config.input).unwrap_or_default();
        let summarizer = Summarizer::new(settings.providers.clone())?;
        println!("\n——— 微信分享摘要 ———");
        println!("{}", summarizer.wechat_summary(&text, filename));
    }

    Ok(())
}
