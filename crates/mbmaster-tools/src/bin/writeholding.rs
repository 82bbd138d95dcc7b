use clap::Parser;
use mbmaster_tools::common::{build_master, init_tracing, TcpConnectionArgs};

#[derive(Debug, Parser)]
#[command(name = "writeholding", about = "Write a single holding register (FC06)")]
struct Args {
    #[command(flatten)]
    conn: TcpConnectionArgs,
    #[arg(long)]
    address: u16,
    #[arg(long)]
    value: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();
    let (mut master, _events) = build_master(&args.conn).await?;

    master.write_single_register(args.address, args.value).await?;
    println!("register={} set to {}", args.address, args.value);
    Ok(())
}
