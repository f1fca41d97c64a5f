pub mod books;

use std::sync::Arc;

use stacks_kernel::ModuleRegistry;

use books::catalog::Catalog;

/// Register all application modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, catalog: Arc<Catalog>) {
    registry.register(books::create_module(catalog));
}
