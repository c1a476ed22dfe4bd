//! 演示场景
//!
//! 固定脚本：握手 -> 发送一段数据 -> 四次挥手。二进制与测试共用。

use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::net::Substrate;
use crate::proto::{EndpointConfig, Initiator, PassiveClose, Responder};
use crate::wire::Port;

/// 演示场景配置
#[derive(Debug, Clone)]
pub struct ScenarioOpts {
    pub client_port: Port,
    pub server_port: Port,
    pub payload: String,
    pub client_cfg: EndpointConfig,
    pub server_cfg: EndpointConfig,
}

impl Default for ScenarioOpts {
    fn default() -> Self {
        Self {
            client_port: 12345,
            server_port: 80,
            payload: "Hello Server!".to_string(),
            client_cfg: EndpointConfig::initiator(),
            server_cfg: EndpointConfig::responder(),
        }
    }
}

/// 每一步结束后两端的状态快照
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: &'static str,
    pub client: String,
    pub server: String,
}

/// 创建一对端点并注册到网络
pub fn build_pair(net: &mut Substrate, opts: &ScenarioOpts) {
    let client = Initiator::with_config(opts.client_port, opts.client_cfg.clone());
    let server = Responder::with_config(opts.server_port, opts.server_cfg.clone());
    net.register_initiator(opts.client_port, client);
    net.register_responder(opts.server_port, server);
}

fn snapshot(net: &Substrate, opts: &ScenarioOpts, step: &'static str) -> StepReport {
    let client = net
        .initiator(opts.client_port)
        .map(Initiator::summary)
        .unwrap_or_default();
    let server = net
        .responder(opts.server_port)
        .map(Responder::summary)
        .unwrap_or_default();
    info!(step, %client, %server, "场景步骤完成");
    StepReport {
        step,
        client,
        server,
    }
}

/// 运行完整场景，返回每一步的状态快照
///
/// 每个本地操作之后都调用一次 `drain_all`，所以在 `Deferred` 与 `Immediate`
/// 两种投递模式下结果一致。
pub fn run_scenario(net: &mut Substrate, opts: &ScenarioOpts) -> Result<Vec<StepReport>> {
    build_pair(net, opts);
    let (cp, sp) = (opts.client_port, opts.server_port);
    let mut steps = Vec::new();

    net.with_initiator(cp, |c, n| c.open(sp, n))?;
    net.drain_all();
    steps.push(snapshot(net, opts, "handshake"));

    net.with_initiator(cp, |c, n| c.send_data(opts.payload.as_bytes(), sp, n))?;
    net.drain_all();
    steps.push(snapshot(net, opts, "data"));

    net.with_initiator(cp, |c, n| c.close(sp, n))?;
    net.drain_all();
    if opts.server_cfg.passive_close == PassiveClose::Deferred {
        net.with_responder(sp, |s, n| s.close(n))?;
        net.drain_all();
    }
    steps.push(snapshot(net, opts, "teardown"));

    net.with_initiator(cp, |c, _| c.expire_time_wait())?;
    steps.push(snapshot(net, opts, "time-wait expired"));

    Ok(steps)
}
