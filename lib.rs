pub mod client;
pub mod config;
pub mod strtree;

use std::error::Error;

// 重新导出主要的公共接口
pub use strtree::{
    Envelope, Envelope2D, Envelope3D, EnvelopeDistance, GeoItem, GeometryDistance, IndexError,
    ItemBoundable, ItemDistance, ItemId, NodeId, STRtree, STRtree2D, STRtree3D,
};

// 重新导出常用类型，便于二进制文件使用
pub use client::{CliArgs, OutputFormatter};
pub use config::StrTreeConfig;

pub type Result<T> = std::result::Result<T, Box<dyn Error + Send + Sync>>;
