use clap::Args;
use mbmaster_client::{Master, MasterError};
use mbmaster_net::{Connection, ConnectionConfig, ConnectionEvent};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Debug, Clone, Args)]
pub struct TcpConnectionArgs {
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
    #[arg(long, default_value_t = 502)]
    pub port: u16,
    #[arg(long, default_value_t = 5000)]
    pub receive_timeout: u64,
    #[arg(long, default_value_t = 5000)]
    pub send_timeout: u64,
    #[arg(long, default_value_t = 1)]
    pub unit_id: u8,
}

pub async fn build_master(
    args: &TcpConnectionArgs,
) -> Result<(Master, UnboundedReceiver<ConnectionEvent>), MasterError> {
    let config = ConnectionConfig::default()
        .with_receive_timeout(Duration::from_millis(args.receive_timeout))
        .with_send_timeout(Duration::from_millis(args.send_timeout));

    let (connection, events) = Connection::open(config);
    let mut master = Master::with_unit_id(connection, args.unit_id);
    master.connect(&args.host, args.port).await?;
    Ok((master, events))
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .try_init();
}

pub fn parse_bool(input: &str) -> Result<bool, String> {
    match input.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(format!("invalid bool value: {input}")),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_bool;

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert_eq!(parse_bool("on"), Ok(true));
        assert_eq!(parse_bool(" 0 "), Ok(false));
        assert!(parse_bool("maybe").is_err());
    }
}
