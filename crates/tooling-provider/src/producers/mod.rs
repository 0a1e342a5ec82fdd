//! Built-in model producers.

mod provider_info;
mod workspace_inventory;

pub use provider_info::{ProviderInfoProducer, PROVIDER_INFO_MODEL};
pub use workspace_inventory::{WorkspaceInventoryProducer, WORKSPACE_INVENTORY_MODEL};
