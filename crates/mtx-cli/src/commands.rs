use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info_span;

use mtx_cli::batch::{run_batch as translate_batch, write_outputs};
use mtx_cli::config::{Overrides, Settings};
use mtx_cli::pipeline::{PipelineError, TranslateOptions, Translator};
use mtx_ingest::{detect, parse_batch};
use mtx_model::Translation;
use mtx_standards::{FieldDefinitionsLoader, MappingStore, prevalidate_dir};
use mtx_validate::PrevalidationEngine;

use crate::cli::{BatchArgs, InputArgs, PrevalidateArgs, TranslateArgs, TranslationFlags};
use crate::summary::{print_batch, print_pairs, print_prevalidation, print_validation};

/// Flags shared by every subcommand.
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub standards_dir: Option<PathBuf>,
}

impl GlobalOptions {
    fn settings(&self, overrides: Overrides) -> Result<Settings> {
        let overrides = Overrides {
            standards_dir: self.standards_dir.clone(),
            ..overrides
        };
        Settings::load(self.config.as_deref(), &overrides)
    }
}

pub fn run_translate(args: &TranslateArgs, global: &GlobalOptions) -> Result<i32> {
    let settings = global.settings(Overrides {
        backend: args.flags.xsd_backend,
        ..Overrides::default()
    })?;
    let raw = read_input(&args.input)?;
    let translator = open_translator(&settings)?;
    let options = translate_options(&args.flags, true);

    let translation = match translator.translate(&raw, &options) {
        Ok(translation) => translation,
        Err(PipelineError::Prevalidation(result)) => {
            eprintln!("error: prevalidation failed");
            print_prevalidation(&result);
            return Ok(1);
        }
        Err(error) => return Err(error).context("translate message"),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&translation)?);
    } else {
        match &translation {
            Translation::Converted(converted) => match &args.output {
                Some(path) => std::fs::write(path, &converted.xml)
                    .with_context(|| format!("write {}", path.display()))?,
                None => println!("{}", converted.xml),
            },
            Translation::PassThrough(pass_through) => {
                println!("{}", serde_json::to_string_pretty(pass_through)?);
            }
        }
        print_validation(&translation);
    }
    Ok(if translation.validation().ok { 0 } else { 1 })
}

pub fn run_prevalidate(args: &PrevalidateArgs, global: &GlobalOptions) -> Result<i32> {
    let settings = global.settings(Overrides::default())?;
    let raw = read_input(&args.input)?;
    let engine = PrevalidationEngine::new(FieldDefinitionsLoader::new(prevalidate_dir(
        &settings.standards_dir,
    )));
    let result = engine
        .validate(&raw, args.force_type.as_deref())
        .context("load field definitions")?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_prevalidation(&result);
    }
    Ok(if result.valid { 0 } else { 1 })
}

pub fn run_detect(args: &InputArgs) -> Result<()> {
    let raw = read_input(args)?;
    let mt_type = detect(&raw, None)?;
    println!("{mt_type}");
    Ok(())
}

pub fn run_batch(args: &BatchArgs, global: &GlobalOptions) -> Result<i32> {
    let settings = global.settings(Overrides {
        backend: args.flags.xsd_backend,
        workers: args.workers,
        ..Overrides::default()
    })?;
    let source_name = args
        .batch_file
        .file_name()
        .map_or_else(|| "batch.dat".to_string(), |name| name.to_string_lossy().into_owned());
    let span = info_span!("batch_file", source = %source_name);
    let _guard = span.enter();

    let text = std::fs::read_to_string(&args.batch_file)
        .with_context(|| format!("read batch {}", args.batch_file.display()))?;
    let batch = parse_batch(&text, &source_name)?;
    let translator = open_translator(&settings)?;
    let options = translate_options(&args.flags, settings.batch.prevalidate);
    let report = translate_batch(&translator, &batch, settings.batch.workers, &options);

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| default_output_dir(&args.batch_file));
    let written = write_outputs(&report, &output_dir)?;
    print_batch(&report, &output_dir, &written);
    Ok(if report.summary.failed == 0 { 0 } else { 1 })
}

pub fn run_pairs(global: &GlobalOptions) -> Result<()> {
    let settings = global.settings(Overrides::default())?;
    let store = MappingStore::open(&settings.standards_dir).context("load routing catalog")?;
    print_pairs(store.pairs().entries(), store.root());
    Ok(())
}

fn open_translator(settings: &Settings) -> Result<Translator> {
    Translator::open(&settings.standards_dir, settings.validator.clone()).with_context(|| {
        format!("open standards directory {}", settings.standards_dir.display())
    })
}

fn translate_options(flags: &TranslationFlags, prevalidate: bool) -> TranslateOptions {
    TranslateOptions {
        force_type: flags.force_type.clone(),
        prevalidate: prevalidate && !flags.no_prevalidate,
        request_id: flags.request_id.clone(),
        now: None,
    }
}

fn read_input(args: &InputArgs) -> Result<String> {
    if args.input == Path::new("-") {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("read message from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(&args.input).with_context(|| format!("read {}", args.input.display()))
}

fn default_output_dir(batch_file: &Path) -> PathBuf {
    let stem = batch_file
        .file_stem()
        .map_or_else(|| "batch".to_string(), |stem| stem.to_string_lossy().into_owned());
    batch_file
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{stem}-out"))
}
