//! 应用层模块 (Application Layer)
//! 负责编辑会话的生命周期、草稿存储，以及对外提供控制器接口。

pub mod draft_store;
pub mod edit_session;
pub mod session_controller;

// 重新导出应用层常用类型，方便上层调用
pub use draft_store::DraftStore;
pub use edit_session::EditSession;
pub use session_controller::{EditSessionController, LoadingFlags, PendingDelete, SessionControllerDeps};
