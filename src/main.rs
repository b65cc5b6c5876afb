// Command-line front end for the compression encoder:
//  - build a compression binding from an optional JSON config file and command-line overrides
//  - `encode`: read a message body from stdin, write it compressed to stdout
//  - `decode`: read a compressed message from stdin, write its body to stdout
//  - `policy` / `content-type`: print what the binding advertises

use error_chain::bail;
use error_chain::ChainedError;
use compress_encoder::errors::*;

use compress_encoder::binding::{CompressionBindingElement, EncodingConfig, PolicyAssertion};
use compress_encoder::compression::Algorithm;
use compress_encoder::encoder::{MessageEncoder, MessageEncoderFactory, DEFAULT_MAX_SIZE_OF_HEADERS};
use compress_encoder::message::Message;

use clap::{App, AppSettings, Arg, SubCommand};
use std::io::prelude::*;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

const APP_NAME: &str = "Compression Encoder";
const ABOUT_STR: &str = "Compresses and decompresses messages the way a gzip/deflate \
    message encoder puts them on the wire";

const ALGORITHM_HELP: &str = "compression algorithm, default gzip";

const MAX_HEADERS_HELP: &str = const_format::formatcp!(
    "maximum size of message headers when decoding, default {}",
    DEFAULT_MAX_SIZE_OF_HEADERS
);

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn binding_element(m: &clap::ArgMatches) -> Result<CompressionBindingElement> {
    let mut element = match m.value_of("config") {
        Some(path) => EncodingConfig::load(Path::new(path))?.create_binding_element()?,
        None => CompressionBindingElement::default(),
    };

    if let Some(algorithm) = m.value_of("algorithm") {
        element.set_algorithm(algorithm.parse::<Algorithm>()?);
    }
    if let Some(inner) = m.value_of("inner") {
        element.set_inner_encoding(Some(inner.parse()?));
    }
    Ok(element)
}

fn run() -> Result<()> {
    let app = App::new(APP_NAME)
        .about(ABOUT_STR)
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("algorithm")
                .short("a")
                .long("algorithm")
                .possible_values(&["gzip", "deflate"])
                .help(ALGORITHM_HELP)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("inner")
                .short("i")
                .long("inner")
                .possible_values(&["text", "binary"])
                .help("inner message encoding, default text")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .help("JSON file with innerMessageEncoding and compressionAlgorithm settings")
                .takes_value(true),
        )
        .subcommands(vec![
            SubCommand::with_name("encode")
                .about("compress a message body read from stdin")
                .arg(
                    Arg::with_name("action")
                        .long("action")
                        .help("action to attach to the message (binary encoding only)")
                        .takes_value(true),
                ),
            SubCommand::with_name("decode")
                .about("decompress a message read from stdin and print its body")
                .arg(
                    Arg::with_name("max-headers")
                        .long("max-headers")
                        .help(MAX_HEADERS_HELP)
                        .takes_value(true),
                ),
            SubCommand::with_name("policy").about("print the exported policy assertion"),
            SubCommand::with_name("content-type").about("print the advertised content type"),
        ]);

    let m = match app.get_matches_safe() {
        Ok(m) => m,
        Err(e)
            if e.kind == clap::ErrorKind::HelpDisplayed
                || e.kind == clap::ErrorKind::VersionDisplayed =>
        {
            e.exit()
        }
        Err(e) => return Err(e).chain_err(|| "error parsing arguments"),
    };

    let element = binding_element(&m)?;
    let factory = element.create_message_encoder_factory()?;
    let encoder = factory.encoder();
    info!(
        content_type = encoder.content_type(),
        inner = ?element.inner_encoding(),
        "encoder ready"
    );

    match m.subcommand() {
        ("encode", Some(sub_m)) => {
            let mut body = Vec::new();
            std::io::stdin()
                .read_to_end(&mut body)
                .chain_err(|| "error reading message body from stdin")?;

            let mut message = Message::new(factory.message_version(), body);
            if let Some(action) = sub_m.value_of("action") {
                message = message.with_action(action);
            }

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            encoder.write_message_to_stream(message, &mut out)
        }

        ("decode", Some(sub_m)) => {
            let max_headers = match sub_m.value_of("max-headers") {
                Some(n) => n
                    .parse()
                    .chain_err(|| format!("error parsing header size \"{}\"", n))?,
                None => DEFAULT_MAX_SIZE_OF_HEADERS,
            };

            let mut message = encoder.read_message_from_stream(
                Box::new(std::io::stdin()),
                max_headers,
                encoder.content_type(),
            )?;
            if let Some(action) = message.action() {
                info!(action, "decoded message");
            }
            let body = message.read_body()?;
            message.close();

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            out.write_all(&body)?;
            out.flush()?;
            Ok(())
        }

        ("policy", Some(_)) => {
            let mut assertions: Vec<PolicyAssertion> = Vec::new();
            element.export_policy(&mut assertions);
            for assertion in assertions.iter() {
                println!("{}", assertion);
            }
            Ok(())
        }

        ("content-type", Some(_)) => {
            println!("{}", encoder.content_type());
            Ok(())
        }

        _ => bail!("unknown subcommand"),
    }
}

fn main() {
    init_logging();
    if let Err(e) = run() {
        eprintln!("{}", e.display_chain().to_string());
        std::process::exit(1);
    }
}
