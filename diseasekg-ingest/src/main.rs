// Copyright 2025 DiseaseKG Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

mod convert;
mod turtle;

use std::fs::File;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use turtle::TurtleDoc;

#[derive(Parser, Debug)]
#[command(author, version, about = "Convert disease statistics CSV exports into HealthRecord triples", long_about = None)]
struct Args {
    /// Statements endpoint of the triple store repository
    #[arg(
        long,
        env = "DISEASEKG_STORE_STATEMENTS",
        default_value = "http://localhost:7200/repositories/disease-kg/statements"
    )]
    endpoint: String,

    /// Print the Turtle document instead of uploading it
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    dataset: Dataset,
}

#[derive(Subcommand, Debug)]
enum Dataset {
    /// IHME GBD export (one record per row)
    Ihme {
        /// Path to the CSV file
        #[arg(long)]
        input: PathBuf,
    },
    /// OWID global malaria deaths series
    OwidMalaria {
        /// Path to the CSV file
        #[arg(long)]
        input: PathBuf,

        /// Source tag recorded on every triple
        #[arg(long, default_value = "https://diseases.org/malaria_data_source")]
        dataset_link: String,
    },
    /// OWID lung cancer deaths-by-sex series (two records per row)
    OwidLungCancer {
        /// Path to the CSV file
        #[arg(long)]
        input: PathBuf,

        /// Source tag recorded on every triple
        #[arg(long, default_value = "https://diseases.org/lung_cancer_data_source")]
        dataset_link: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "diseasekg_ingest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let doc = match &args.dataset {
        Dataset::Ihme { input } => convert::convert_ihme(open(input)?)?,
        Dataset::OwidMalaria {
            input,
            dataset_link,
        } => convert::convert_owid_malaria(open(input)?, dataset_link)?,
        Dataset::OwidLungCancer {
            input,
            dataset_link,
        } => convert::convert_owid_lung_cancer(open(input)?, dataset_link)?,
    };
    tracing::info!(records = doc.len(), "converted dataset");
    if doc.is_empty() {
        bail!("input produced no records");
    }

    if args.dry_run {
        print!("{}", doc.to_turtle());
        return Ok(());
    }

    upload(&doc, &args.endpoint).await
}

fn open(path: &PathBuf) -> Result<File> {
    File::open(path).with_context(|| format!("cannot open {}", path.display()))
}

/// Upload the document to the statements endpoint as Turtle.
async fn upload(doc: &TurtleDoc, endpoint: &str) -> Result<()> {
    let response = reqwest::Client::new()
        .post(endpoint)
        .header(reqwest::header::CONTENT_TYPE, "text/turtle")
        .body(doc.to_turtle())
        .send()
        .await
        .with_context(|| format!("cannot reach {endpoint}"))?;

    let status = response.status();
    if status.as_u16() == 200 || status.as_u16() == 204 {
        tracing::info!(records = doc.len(), "uploaded to store");
        Ok(())
    } else {
        let text = response.text().await.unwrap_or_default();
        bail!("upload failed: {status} - {text}");
    }
}
