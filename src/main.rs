use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use lyric_engine::{
    EngineConfig, LyricDocument, LyricLine,
    converter::{
        generators::{
            ass_generator::generate_ass, lrc_generator::generate_lrc,
            ttml_generator::generate_ttml,
        },
        parsers::{
            parse_smart_lrc,
            qrc_parser::{QrcParser, looks_like_qrc},
        },
        processors::{
            aligner::align_lyrics,
            bracket_replacer::BracketReplacer,
            chinese_conversion_processor::{ChineseConversionProcessor, ChineseConverterCache},
            metadata_stripper::{MetadataStripper, merge_with_default_rules},
        },
    },
    export::ExportFormat,
    playback::resolve_active_index,
};
use lyric_engine_core::{
    AlignTarget, BracketReplacementPreset, ChineseConversionConfig, LyricEncoding,
    SongMetadataHint,
};
use strum::IntoEnumIterator;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "lyric-engine",
    version,
    about = "解析、对齐、清理并转换 LRC / QRC 歌词"
)]
struct Cli {
    /// TOML 配置文件路径
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 转换歌词格式并输出到标准输出
    Convert {
        /// 主歌词文件（LRC 家族或 QRC）
        input: PathBuf,
        /// 输出格式：lrc、ttml 或 ass
        #[arg(long, default_value = "lrc")]
        to: ExportFormat,
        /// 翻译文件（LRC）
        #[arg(long)]
        translation: Option<PathBuf>,
        /// 音译文件（主歌词为 QRC 时为 QRC，否则为 LRC）
        #[arg(long)]
        romanization: Option<PathBuf>,
        /// 把输入按 QRC 解析，即使没有 XML 外壳
        #[arg(long)]
        qrc: bool,
        /// 移除开头和结尾的制作信息行
        #[arg(long)]
        strip: bool,
        /// 括号替换：dash、angle、corner 或自定义符号
        #[arg(long)]
        brackets: Option<String>,
        /// 转换为繁体中文
        #[arg(long)]
        traditional: bool,
        /// 歌曲名
        #[arg(long)]
        title: Option<String>,
        /// 歌手名
        #[arg(long)]
        artist: Option<String>,
        /// TTML 声明的编码
        #[arg(long)]
        encoding: Option<LyricEncoding>,
    },
    /// 输出指定播放时间对应的歌词行下标
    Resolve {
        /// 歌词文件（LRC 家族或 QRC）
        input: PathBuf,
        /// 播放时间（毫秒）
        #[arg(long, allow_negative_numbers = true)]
        at: i64,
        /// 歌词偏移（毫秒），默认使用配置中的值
        #[arg(long, allow_negative_numbers = true)]
        offset: Option<i64>,
        /// 最多同时高亮的行数，默认使用配置中的值
        #[arg(long)]
        max_keep: Option<usize>,
        /// 把输入按 QRC 解析，即使没有 XML 外壳
        #[arg(long)]
        qrc: bool,
    },
    /// 列出支持的导出格式
    Formats,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Convert {
            input,
            to,
            translation,
            romanization,
            qrc,
            strip,
            brackets,
            traditional,
            title,
            artist,
            encoding,
        } => {
            let content = read_text(&input)?;
            let translation = translation.as_deref().map(read_text).transpose()?;
            let romanization = romanization.as_deref().map(read_text).transpose()?;

            let document = parse_input(
                &content,
                qrc,
                translation.as_deref(),
                romanization.as_deref(),
            );
            info!("[Cli] 解析完成: 格式 {}, 共 {} 行", document.format, document.len());

            let mut lines = document.lines;

            if strip {
                let mut options = merge_with_default_rules(&config.metadata_stripper);
                if let Some(title) = title.as_deref() {
                    let artists: Vec<&str> = artist.as_deref().into_iter().collect();
                    options.match_metadata = Some(SongMetadataHint::new(title, &artists));
                }
                lines = MetadataStripper::new(&options).strip(&lines);
            }

            let preset = brackets
                .as_deref()
                .map(parse_bracket_preset)
                .or_else(|| config.bracket_replacement.clone());
            if let Some(preset) = preset {
                lines = BracketReplacer::new(&preset).apply(&lines);
            }

            if traditional || config.export.to_traditional {
                let cache = ChineseConverterCache::new();
                lines = ChineseConversionProcessor::new(ChineseConversionConfig::S2t)
                    .process(&lines, &cache);
            }

            let output = match to {
                ExportFormat::Lrc => generate_lrc(&lines, &config.lrc)?,
                ExportFormat::Ttml => {
                    let mut options = config.ttml.clone();
                    if let Some(encoding) = encoding {
                        options.encoding = encoding;
                    }
                    if let Some(title) = title {
                        options.title = title;
                    }
                    generate_ttml(&lines, &options)?
                }
                ExportFormat::Ass => {
                    let mut options = config.ass.clone();
                    if let Some(title) = title {
                        options.title = title;
                    }
                    if let Some(artist) = artist {
                        options.artist = artist;
                    }
                    generate_ass(&lines, &options)?
                }
                ExportFormat::Yrc => bail!("不支持导出为 {to}"),
            };

            println!("{output}");
        }
        Command::Resolve {
            input,
            at,
            offset,
            max_keep,
            qrc,
        } => {
            let content = read_text(&input)?;
            let lines = parse_input(&content, qrc, None, None).lines;
            let offset = offset.unwrap_or(config.playback.offset_ms);
            let max_keep = max_keep.unwrap_or(config.playback.max_keep);

            match resolve_active_index(at, &lines, offset, max_keep) {
                Some(index) => println!("{index}\t{}", lines[index].text()),
                None => println!("-1"),
            }
        }
        Command::Formats => {
            for format in ExportFormat::iter().filter(|f| *f != ExportFormat::Yrc) {
                println!("{format}");
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let content = read_text(path)?;
    let config = EngineConfig::from_toml_str(&content)
        .with_context(|| format!("解析配置文件 {} 失败", path.display()))?;
    debug!("[Cli] 已加载配置文件 {}", path.display());
    Ok(config)
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("读取 {} 失败", path.display()))
}

fn parse_input(
    content: &str,
    force_qrc: bool,
    translation: Option<&str>,
    romanization: Option<&str>,
) -> LyricDocument {
    if force_qrc || looks_like_qrc(content) {
        return QrcParser::default().parse(content, translation, romanization);
    }

    let mut document = parse_smart_lrc(content);
    for (text, target) in [
        (translation, AlignTarget::Translation),
        (romanization, AlignTarget::Romanization),
    ] {
        if let Some(text) = text {
            let secondary: Vec<LyricLine> = parse_smart_lrc(text).lines;
            document.lines = align_lyrics(&document.lines, &secondary, target);
        }
    }
    document
}

fn parse_bracket_preset(value: &str) -> BracketReplacementPreset {
    match value {
        "dash" => BracketReplacementPreset::Dash,
        "angle" => BracketReplacementPreset::AngleBrackets,
        "corner" => BracketReplacementPreset::CornerBrackets,
        custom => BracketReplacementPreset::Custom(custom.to_string()),
    }
}
