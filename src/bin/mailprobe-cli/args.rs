use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use mailprobe_lib::{ProbeConfig, UnreachablePolicy};

#[derive(Parser)]
#[command(name = "mailprobe-cli", version, about = "Sonde SMTP de délivrabilité (sans envoi de message)")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,

    /// logs détaillés, transcript SMTP inclus
    #[arg(long, global = true)]
    pub verbose: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// vérifie une seule adresse
    Check {
        email: String,
        /// sortie JSON au lieu du résumé lisible
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        probe: ProbeArgs,
    },
    /// vérifie une liste d'adresses (une par ligne)
    Bulk {
        /// fichier d'entrée, `-` pour stdin
        #[arg(long, default_value = "-")]
        input: String,
        /// nombre de vérifications simultanées
        #[arg(long, default_value_t = 10)]
        concurrency: usize,
        #[arg(long, value_enum, default_value_t = OutFormat::Ndjson)]
        out: OutFormat,
        /// remplace la liste intégrée de domaines jetables
        #[arg(long = "disposable-list")]
        disposable_list: Option<PathBuf>,
        #[command(flatten)]
        probe: ProbeArgs,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutFormat {
    /// une ligne JSON par résultat, dans l'ordre de fin
    Ndjson,
    /// rapport complet, dans l'ordre d'entrée
    Json,
    /// CSV dans l'ordre d'entrée (feature `with-csv`)
    Csv,
}

#[derive(Args, Clone)]
pub struct ProbeArgs {
    /// enveloppe MAIL FROM
    #[arg(long = "from", default_value = "verify@example.com")]
    pub from: String,
    /// nom utilisé pour EHLO/HELO
    #[arg(long, default_value = "example.com")]
    pub helo: String,
    /// timeout par opération réseau (secondes)
    #[arg(long, default_value_t = 7)]
    pub timeout: u64,
    /// nombre maximum d'MX interrogés
    #[arg(long = "max-mx", default_value_t = 3)]
    pub max_mx: usize,
    /// ports SMTP, séparés par des virgules
    #[arg(long, default_value = "25")]
    pub ports: String,
    /// ne tente pas STARTTLS même si le serveur le propose
    #[arg(long = "no-starttls")]
    pub no_starttls: bool,
    /// considère un domaine injoignable comme délivrable
    #[arg(long = "assume-deliverable")]
    pub assume_deliverable: bool,
}

impl ProbeArgs {
    pub fn to_config(&self, verbose: bool) -> Result<ProbeConfig> {
        let ports = ProbeConfig::parse_ports(&self.ports).context("invalid --ports")?;
        Ok(ProbeConfig {
            from_address: self.from.clone(),
            helo_name: self.helo.clone(),
            timeout_seconds: self.timeout,
            max_mx_hosts: self.max_mx,
            ports,
            starttls: !self.no_starttls,
            verbose,
            unreachable_policy: if self.assume_deliverable {
                UnreachablePolicy::AssumeDeliverable
            } else {
                UnreachablePolicy::Unknown
            },
        })
    }
}
