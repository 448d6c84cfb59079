use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use passbook_core::{AccountFormatEngine, AccountInput, BankId};
use passbook_face::{
    FaceBox, FaceCaptureController, HttpVerifier, SessionOutcome, StaticDetector,
    StillImageSource, Subject,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "passbook", about = "Account number formatting and face verification")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List banks with a known account number layout
    Banks {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Format raw input as an account number for a bank
    Format {
        /// Bank name or slug (e.g. "국민은행", "kookmin")
        bank: BankId,
        /// Digits, with or without separators
        input: String,
    },
    /// Check that an account number is complete for a bank
    Validate {
        bank: BankId,
        number: String,
    },
    /// Re-check an account number against a different bank
    Switch {
        number: String,
        /// Newly selected bank
        #[arg(long)]
        to: BankId,
    },
    /// Run a face capture session on an image file and submit the crop
    FaceVerify {
        /// Image used as the camera feed
        #[arg(long)]
        image: PathBuf,
        /// Face box in image pixels: x,y,width,height
        #[arg(long, value_parser = parse_face_box)]
        face: FaceBox,
        /// Subject identifier (login email)
        #[arg(long)]
        email: String,
        /// URL of the enrolled reference photo
        #[arg(long)]
        reference_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::Banks { json } => {
            let engine = engine(&config)?;
            let specs = engine.registry().specs();
            if json {
                let list: Vec<_> = specs
                    .iter()
                    .map(|s| {
                        serde_json::json!({
                            "name": s.bank().name(),
                            "slug": s.bank().slug(),
                            "groups": s.groups(),
                            "prefix": s.prefix(),
                            "pattern": s.pattern().as_str(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&list)?);
            } else {
                for s in specs {
                    let slug = s.bank().slug().unwrap_or("-");
                    println!("{:<12} {:<10} {}", s.bank().name(), slug, s.template());
                }
            }
        }
        Commands::Format { bank, input } => {
            let engine = engine(&config)?;
            let mut field = AccountInput::new(&engine);
            field.select_bank(bank);
            println!("{}", field.input(&input));
            match field.check() {
                Ok(()) => println!("complete"),
                Err(e) => println!("incomplete: {e}"),
            }
        }
        Commands::Validate { bank, number } => {
            let engine = engine(&config)?;
            if !engine.validate(&number, &bank) {
                let mut field = AccountInput::new(&engine);
                field.select_bank(bank.clone());
                field.input(&number);
                match field.check() {
                    Err(e) => bail!("{number}: {e}"),
                    // Digits are complete but the separators were not canonical
                    Ok(()) => bail!("{number}: expected {}", field.formatted()),
                }
            }
            println!("{number}: valid for {bank}");
        }
        Commands::Switch { number, to } => {
            let engine = engine(&config)?;
            let switched = engine.on_bank_change(&number, &to);
            if switched.is_empty() {
                println!("cleared: the number does not match the {to} format");
            } else {
                println!("{switched}");
            }
        }
        Commands::FaceVerify {
            image,
            face,
            email,
            reference_url,
        } => {
            let outcome = face_verify(&config, image, face, email, reference_url).await?;
            if outcome != SessionOutcome::Succeeded {
                bail!("face verification did not complete");
            }
        }
    }

    Ok(())
}

fn engine(config: &Config) -> Result<AccountFormatEngine> {
    let registry = config.registry().context("loading bank registry")?;
    Ok(AccountFormatEngine::new(registry))
}

async fn face_verify(
    config: &Config,
    image: PathBuf,
    face: FaceBox,
    email: String,
    reference_url: String,
) -> Result<SessionOutcome> {
    let source = StillImageSource::open(&image)?;
    let verifier = Arc::new(HttpVerifier::new(&config.verify_url, config.verify_timeout())?);
    tracing::info!(url = %config.verify_url, "using verification endpoint");

    let controller = FaceCaptureController::new(
        source,
        StaticDetector::new(face),
        verifier,
        Subject {
            id: email,
            reference_image_url: reference_url,
        },
        config.capture(),
    );

    let (handle, mut events) = controller.spawn();
    let deadline = tokio::time::sleep(config.verify_timeout());
    tokio::pin!(deadline);
    let mut stopping = false;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => println!("{}", event.message()),
                None => break,
            },
            _ = &mut deadline, if !stopping => {
                tracing::warn!("face verification timed out");
                stopping = true;
                handle.cancel();
            }
            _ = tokio::signal::ctrl_c(), if !stopping => {
                stopping = true;
                handle.cancel();
            }
        }
    }

    Ok(handle.join().await)
}

fn parse_face_box(s: &str) -> Result<FaceBox, String> {
    let parts: Vec<f32> = s
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("expected x,y,width,height: {e}"))?;
    match parts[..] {
        [x, y, width, height] if width > 0.0 && height > 0.0 => {
            Ok(FaceBox::new(x, y, width, height))
        }
        [_, _, _, _] => Err("width and height must be positive".into()),
        _ => Err(format!("expected 4 values, got {}", parts.len())),
    }
}
