// Domain layer: 分享流程的資料模型與介面 (ports)

pub mod model;
pub mod ports;
