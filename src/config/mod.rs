//! 配置管理
//!
//! 结构体定义在 `structs`，加载逻辑在 `impl`。

mod r#impl;
mod structs;

pub use structs::*;
