use clap::Parser;
use mbmaster_tools::common::{build_master, init_tracing, parse_bool, TcpConnectionArgs};

#[derive(Debug, Parser)]
#[command(name = "writecoil", about = "Write a single coil (FC05)")]
struct Args {
    #[command(flatten)]
    conn: TcpConnectionArgs,
    #[arg(long)]
    address: u16,
    #[arg(long, value_parser = parse_bool)]
    value: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();
    let (mut master, _events) = build_master(&args.conn).await?;

    master.write_single_coil(args.address, args.value).await?;
    println!("coil={} set to {}", args.address, args.value);
    Ok(())
}
