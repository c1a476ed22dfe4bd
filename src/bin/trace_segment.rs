//! 单报文段编解码追踪
//!
//! 按命令行参数构造一个报文段，打印摘要、bit 编码以及解码回来的结果。
//! 也可以用 `--bits` 直接解码一段 `0`/`1` 文本。

use clap::Parser;
use tcpsim_rs::wire::{self, Bits, Segment, TcpFlags};
use tracing::debug;

#[derive(Debug, Parser)]
#[command(name = "trace-segment", about = "单报文段编解码追踪")]
struct Args {
    #[arg(long, default_value_t = 5000)]
    src_port: u16,
    #[arg(long, default_value_t = 80)]
    dst_port: u16,
    #[arg(long, default_value_t = 100)]
    seq: u32,
    #[arg(long, default_value_t = 0)]
    ack: u32,
    /// 逗号分隔的控制位，例如 `SYN,ACK`
    #[arg(long, default_value = "SYN")]
    flags: String,
    #[arg(long, default_value = "")]
    payload: String,
    /// 直接解码这段 bit 文本，忽略其余参数
    #[arg(long)]
    bits: Option<String>,
}

fn parse_flags(raw: &str) -> Result<TcpFlags, String> {
    let mut flags = TcpFlags::NONE;
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match name.to_ascii_uppercase().as_str() {
            "URG" => flags.urg = true,
            "ACK" => flags.ack = true,
            "PSH" => flags.psh = true,
            "RST" => flags.rst = true,
            "SYN" => flags.syn = true,
            "FIN" => flags.fin = true,
            other => return Err(format!("unknown flag {other:?}")),
        }
    }
    Ok(flags)
}

fn run(args: Args) -> Result<(), String> {
    if let Some(text) = args.bits {
        let bits: Bits = text.trim().parse().map_err(|e| format!("{e}"))?;
        let seg = wire::decode(&bits).map_err(|e| format!("{e}"))?;
        println!("{seg}");
        return Ok(());
    }

    let flags = parse_flags(&args.flags)?;
    let seg = Segment::new(args.src_port, args.dst_port, args.seq, args.ack, flags)
        .with_payload(args.payload.into_bytes());
    let bits = wire::encode(&seg);
    debug!(len = bits.len(), "编码完成");
    let decoded = wire::decode(&bits).map_err(|e| format!("{e}"))?;

    println!("{seg}");
    println!("{bits}");
    println!("{decoded}");
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .init();

    if let Err(err) = run(Args::parse()) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
