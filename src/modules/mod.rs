pub mod books;

use std::sync::Arc;
use std::time::Duration;

use shelf_kernel::settings::Settings;
use shelf_kernel::ModuleRegistry;

use crate::app::Storage;
use books::service::BookService;

/// Register all project-specific modules with the registry
pub fn register_all(
    registry: &mut ModuleRegistry,
    settings: &Settings,
    storage: &Storage,
) -> anyhow::Result<()> {
    let service = BookService::new(
        storage.book_repository(),
        Duration::from_millis(settings.database.statement_timeout_ms),
    );
    registry.register(books::create_module(Arc::new(service)))?;
    Ok(())
}
