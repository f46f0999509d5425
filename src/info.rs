use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};
use tracing::info;

/// Host description logged once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub system: String,
    pub kernel: String,
    pub os_version: String,
    pub host_name: String,
    pub arch: &'static str,
    pub processor: String,
    pub total_memory: u64,
    pub logical_cores: usize,
}

impl HostInfo {
    pub fn collect() -> Self {
        let sys = System::new_with_specifics(
            RefreshKind::new()
                .with_memory(MemoryRefreshKind::new().with_ram())
                .with_cpu(CpuRefreshKind::new()),
        );

        let unknown = || "unknown".to_string();

        Self {
            system: System::name().unwrap_or_else(unknown),
            kernel: System::kernel_version().unwrap_or_else(unknown),
            os_version: System::long_os_version()
                .or_else(System::os_version)
                .unwrap_or_else(unknown),
            host_name: System::host_name().unwrap_or_else(unknown),
            arch: std::env::consts::ARCH,
            processor: sys
                .cpus()
                .first()
                .map(|cpu| cpu.brand().trim().to_string())
                .filter(|brand| !brand.is_empty())
                .unwrap_or_else(unknown),
            total_memory: sys.total_memory(),
            logical_cores: num_cpus::get(),
        }
    }
}

/// Log the host environment and the parallelism this run will use
pub fn log_system_info(parallelism: usize) {
    let host = HostInfo::collect();
    let total_memory_mib = host.total_memory / (1024 * 1024);

    info!("=== SYSTEM INFO =========================================");
    info!("System          : {}", host.system);
    info!("Kernel          : {}", host.kernel);
    info!("Version         : {}", host.os_version);
    info!("Host            : {}", host.host_name);
    info!("Machine         : {}", host.arch);
    info!("Processor       : {}", host.processor);
    info!("Memory          : {} MiB", total_memory_mib);
    info!("Logical cores   : {}", host.logical_cores);
    info!("Workers         : {}", parallelism);
    info!("img-recompress  : {}", env!("CARGO_PKG_VERSION"));
    info!("=========================================================");
}
