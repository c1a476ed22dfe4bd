//! 握手/数据/挥手演示
//!
//! 一个 initiator 与一个 responder 跑完整个连接生命周期，打印每一步的状态。

use clap::{Parser, ValueEnum};
use std::fs;
use std::path::PathBuf;
use tcpsim_rs::demo::{ScenarioOpts, run_scenario};
use tcpsim_rs::net::{DispatchMode, Substrate, SubstrateConfig};
use tcpsim_rs::proto::{AckPolicy, EndpointConfig, PassiveClose};
use tcpsim_rs::trace::TraceLog;
use tracing::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Dispatch {
    Deferred,
    Immediate,
}

#[derive(Debug, Parser)]
#[command(name = "handshake-demo", about = "单连接演示：三次握手 -> 数据 -> 四次挥手")]
struct Args {
    #[arg(long, default_value_t = 12345)]
    client_port: u16,

    #[arg(long, default_value_t = 80)]
    server_port: u16,

    /// 发送的数据
    #[arg(long, default_value = "Hello Server!")]
    payload: String,

    /// 投递模式
    #[arg(long, value_enum, default_value_t = Dispatch::Deferred)]
    dispatch: Dispatch,

    /// 收到数据后不自动回 ACK（两端统一）
    #[arg(long, default_value_t = false)]
    manual_ack: bool,

    /// responder 收到 FIN 后不立即发送自己的 FIN，而是由脚本显式关闭
    #[arg(long, default_value_t = false)]
    deferred_close: bool,

    /// 输出投递轨迹 JSON；不填则不生成
    #[arg(long)]
    trace_json: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();

    let ack_policy = if args.manual_ack {
        AckPolicy::Manual
    } else {
        AckPolicy::Immediate
    };
    let passive_close = if args.deferred_close {
        PassiveClose::Deferred
    } else {
        PassiveClose::Immediate
    };
    let opts = ScenarioOpts {
        client_port: args.client_port,
        server_port: args.server_port,
        payload: args.payload,
        client_cfg: EndpointConfig {
            ack_policy,
            ..EndpointConfig::initiator()
        },
        server_cfg: EndpointConfig {
            ack_policy,
            passive_close,
            ..EndpointConfig::responder()
        },
    };

    let dispatch = match args.dispatch {
        Dispatch::Deferred => DispatchMode::Deferred,
        Dispatch::Immediate => DispatchMode::Immediate,
    };
    let mut net = Substrate::new(SubstrateConfig { dispatch });
    if args.trace_json.is_some() {
        net.trace = Some(TraceLog::default());
    }

    let steps = match run_scenario(&mut net, &opts) {
        Ok(steps) => steps,
        Err(err) => {
            eprintln!("scenario failed: {err}");
            std::process::exit(1);
        }
    };

    for s in &steps {
        println!("[{}] {} | {}", s.step, s.client, s.server);
    }
    println!(
        "done: enqueued={}, delivered={}, dropped_unknown={}, dropped_malformed={}",
        net.stats.enqueued, net.stats.delivered, net.stats.dropped_unknown, net.stats.dropped_malformed
    );

    if let Some(path) = args.trace_json {
        let Some(log) = net.trace.as_ref() else {
            return;
        };
        match log.to_json() {
            Ok(raw) => {
                if let Err(err) = fs::write(&path, raw) {
                    eprintln!("write {}: {err}", path.display());
                    std::process::exit(1);
                }
                info!(path = %path.display(), events = log.events.len(), "轨迹已写出");
            }
            Err(err) => {
                eprintln!("serialize trace: {err}");
                std::process::exit(1);
            }
        }
    }
}
