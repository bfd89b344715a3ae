#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub page_size: usize,
    pub buffer_pool_capacity: usize,
    pub slots_per_page: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            page_size: 4096,
            buffer_pool_capacity: 50,
            slots_per_page: 64,
        }
    }
}
