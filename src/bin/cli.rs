//! todokv CLI Client
//!
//! Command-line interface for a running todokv server.

use std::io::Read;

use clap::{Parser, Subcommand};
use thiserror::Error;
use todokv::{Encoding, Item, ItemPatch, TodoError};

/// todokv CLI
#[derive(Parser, Debug)]
#[command(name = "todokv-cli")]
#[command(about = "CLI for the todokv to-do list server")]
#[command(version)]
struct Args {
    /// Server base URL
    #[arg(short, long, default_value = "http://127.0.0.1:5000")]
    server: String,

    /// Talk to the server in protobuf instead of JSON
    #[arg(short, long)]
    protobuf: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List all items
    List,

    /// Show one item
    Get {
        /// Item id
        id: u64,
    },

    /// Create an item
    Add {
        /// Item text
        text: String,
    },

    /// Replace an item's text, optionally setting its completion flag
    Update {
        /// Item id
        id: u64,

        /// New text
        text: String,

        /// Completion flag
        #[arg(long)]
        done: Option<bool>,
    },

    /// Delete an item
    Delete {
        /// Item id
        id: u64,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("server answered {status}: {message}")]
    Status { status: u16, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Codec(#[from] TodoError),
}

/// A blocking client for one server and encoding
struct Client {
    base: String,
    encoding: Encoding,
}

impl Client {
    fn url(&self, path: &str) -> String {
        format!(
            "{}{}?use_protobuf={}",
            self.base.trim_end_matches('/'),
            path,
            self.encoding.flag()
        )
    }

    fn send(&self, request: ureq::Request, body: Option<Vec<u8>>) -> Result<Vec<u8>, CliError> {
        let result = match body {
            Some(bytes) => request
                .set("Content-Type", self.encoding.content_type())
                .send_bytes(&bytes),
            None => request.call(),
        };

        match result {
            Ok(response) => {
                let mut buf = Vec::new();
                response.into_reader().read_to_end(&mut buf)?;
                Ok(buf)
            }
            Err(ureq::Error::Status(status, response)) => Err(CliError::Status {
                status,
                message: response.into_string().unwrap_or_default(),
            }),
            Err(e) => Err(CliError::Transport(e.to_string())),
        }
    }

    fn list(&self) -> Result<Vec<Item>, CliError> {
        let body = self.send(ureq::get(&self.url("/")), None)?;
        Ok(self.encoding.decode_list(&body)?)
    }

    fn get(&self, id: u64) -> Result<Item, CliError> {
        let body = self.send(ureq::get(&self.url(&format!("/{}", id))), None)?;
        Ok(self.encoding.decode_item(&body)?)
    }

    fn add(&self, text: String) -> Result<Item, CliError> {
        let payload = self.encoding.encode_patch(&ItemPatch::text(text))?;
        let body = self.send(ureq::post(&self.url("/")), Some(payload))?;
        Ok(self.encoding.decode_item(&body)?)
    }

    fn update(&self, id: u64, patch: ItemPatch) -> Result<Item, CliError> {
        let payload = self.encoding.encode_patch(&patch)?;
        let body = self.send(ureq::put(&self.url(&format!("/{}", id))), Some(payload))?;
        Ok(self.encoding.decode_item(&body)?)
    }

    fn delete(&self, id: u64) -> Result<(), CliError> {
        self.send(ureq::delete(&self.url(&format!("/{}", id))), None)?;
        Ok(())
    }
}

fn print_item(item: &Item) {
    let mark = if item.done { "x" } else { " " };
    println!("#{} [{}] {}", item.id, mark, item.text);
}

fn run(args: Args) -> Result<(), CliError> {
    let client = Client {
        base: args.server,
        encoding: if args.protobuf {
            Encoding::Protobuf
        } else {
            Encoding::Json
        },
    };

    match args.command {
        Commands::List => {
            for item in client.list()? {
                print_item(&item);
            }
        }
        Commands::Get { id } => print_item(&client.get(id)?),
        Commands::Add { text } => print_item(&client.add(text)?),
        Commands::Update { id, text, done } => {
            let patch = ItemPatch {
                text: Some(text),
                done,
            };
            print_item(&client.update(id, patch)?);
        }
        Commands::Delete { id } => {
            client.delete(id)?;
            println!("deleted #{}", id);
        }
    }

    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
