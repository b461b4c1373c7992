//! 主题图谱性能基准：cargo run --release --example performance_benchmark

use daccy_tree::model::performance::run_performance_suite;
use tracing_subscriber::fmt::SubscriberBuilder;

fn main() -> anyhow::Result<()> {
    let _ = SubscriberBuilder::default()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let results = run_performance_suite();

    println!("{:<24} {:>10} {:>6}  说明", "操作", "耗时(ms)", "结果");
    for r in &results {
        println!(
            "{:<24} {:>10} {:>6}  {}",
            r.operation,
            r.duration_ms,
            if r.success { "通过" } else { "失败" },
            r.details
        );
    }

    let failed = results.iter().filter(|r| !r.success).count();
    if failed > 0 {
        anyhow::bail!("{} 项性能测试失败", failed);
    }
    Ok(())
}
