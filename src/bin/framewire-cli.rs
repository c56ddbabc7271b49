use std::time::Instant;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use framewire::framing::{read_header, write_frame, BoundedReader};

#[derive(Parser)]
#[command(name = "framewire-cli")]
#[command(about = "Client for a running framewire server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "127.0.0.1:17017")]
    addr: String,

    /// Largest reply payload to accept
    #[arg(long, default_value_t = 16 * 1024 * 1024)]
    max_frame_len: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one frame per payload and print each reply
    Send {
        #[arg(required = true)]
        payloads: Vec<String>,
    },
    /// Send an empty frame and report the round-trip time
    Ping,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let stream = TcpStream::connect(&cli.addr).await?;
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    let payloads: Vec<Vec<u8>> = match &cli.command {
        Commands::Send { payloads } => payloads.iter().map(|p| p.as_bytes().to_vec()).collect(),
        Commands::Ping => vec![Vec::new()],
    };

    for (seq, payload) in (1u32..).zip(payloads) {
        let started = Instant::now();
        write_frame(&mut writer, seq, &payload).await?;
        writer.flush().await?;

        let header = read_header(&mut reader)
            .await?
            .ok_or("server closed the connection")?;
        header.check_length(cli.max_frame_len)?;
        if header.seq != seq {
            eprintln!("Warning: reply sequence {} does not match request {}", header.seq, seq);
        }

        let mut frame = BoundedReader::new(&mut reader, u64::from(header.length), true, false);
        let mut reply = Vec::new();
        frame.read_remaining(&mut reply).await?;
        frame.close().await?;

        match cli.command {
            Commands::Ping => println!("pong from {} in {:?}", cli.addr, started.elapsed()),
            Commands::Send { .. } => println!("{}", String::from_utf8_lossy(&reply)),
        }
    }

    writer.shutdown().await?;
    Ok(())
}
