pub mod books;

use std::sync::Arc;

use libris_kernel::{settings::Settings, ModuleRegistry};

use books::store::JsonBookStore;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, settings: &Settings) {
    let store = Arc::new(JsonBookStore::new(&settings.storage.data_path));
    registry.register(books::create_module(store));
}
