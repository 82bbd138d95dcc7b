use clap::Parser;
use mbmaster_tools::common::{build_master, init_tracing, TcpConnectionArgs};
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "readcoils", about = "Read coils (FC01)")]
struct Args {
    #[command(flatten)]
    conn: TcpConnectionArgs,
    #[arg(long)]
    start: u16,
    #[arg(long)]
    quantity: u16,
    /// Poll repeatedly with this period in milliseconds.
    #[arg(long)]
    interval: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();
    let (mut master, _events) = build_master(&args.conn).await?;

    loop {
        let values = master.read_coils(args.start, args.quantity).await?;
        for (idx, value) in values.iter().enumerate() {
            println!("coil={} value={}", args.start + idx as u16, value);
        }

        match args.interval {
            Some(millis) => tokio::time::sleep(Duration::from_millis(millis)).await,
            None => break,
        }
    }
    Ok(())
}
