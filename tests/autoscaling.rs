//! Autoscaling against live mock workers.

use std::sync::Arc;
use std::time::Duration;

use elastic_lb::autoscale::AutoscaleController;
use elastic_lb::collector::MetricsCollector;
use elastic_lb::config::LbConfig;
use elastic_lb::load_balancer::pool::WorkerPool;
use elastic_lb::worker::HttpWorkerClient;

mod common;
use common::{client, config_for, spawn_balancer, spawn_workers, MockWorker};

fn controller(config: &LbConfig) -> (Arc<WorkerPool>, AutoscaleController) {
    let timeout = Duration::from_millis(config.timeouts.probe_ms);
    let pool = Arc::new(
        WorkerPool::from_config(&config.workers, config.autoscale.min_primary_servers).unwrap(),
    );
    let client = Arc::new(HttpWorkerClient::new(timeout).unwrap());
    let collector = Arc::new(MetricsCollector::new(pool.clone(), client, timeout));
    let controller = AutoscaleController::new(pool.clone(), collector, config.autoscale.clone());
    (pool, controller)
}

fn set_all_cpu(workers: &[MockWorker], usage: u8) {
    for w in workers {
        w.set_cpu(usage);
    }
}

#[tokio::test]
async fn test_overload_grows_primary_one_per_cycle() {
    let primary = spawn_workers(3).await;
    let standby = spawn_workers(2).await;
    set_all_cpu(&primary, 90);
    set_all_cpu(&standby, 90);

    let (pool, controller) = controller(&config_for(&primary, &standby));

    controller.run_cycle().await;
    assert_eq!(pool.sizes(), (4, 1));
    // Last standby entry is promoted first.
    assert_eq!(pool.primary()[3].id.as_str(), standby[1].url);

    controller.run_cycle().await;
    assert_eq!(pool.sizes(), (5, 0));

    let report = controller.run_cycle().await;
    assert!(report.is_empty());
    assert_eq!(pool.sizes(), (5, 0));
}

#[tokio::test]
async fn test_idle_workers_shrink_to_floor() {
    let primary = spawn_workers(5).await;
    set_all_cpu(&primary, 10);

    let mut config = config_for(&primary, &[]);
    config.autoscale.min_primary_servers = 3;
    let (pool, controller) = controller(&config);

    let report = controller.run_cycle().await;
    assert_eq!(report.demoted.len(), 2);
    assert_eq!(pool.sizes(), (3, 2));

    controller.run_cycle().await;
    assert_eq!(pool.sizes(), (3, 2));
}

#[tokio::test]
async fn test_unreachable_worker_counts_as_idle() {
    let primary = spawn_workers(2).await;
    set_all_cpu(&primary, 50);

    let mut config = config_for(&primary, &[]);
    config.workers.primary.push("http://127.0.0.1:9".to_string());
    config.timeouts.probe_ms = 200;
    let (pool, controller) = controller(&config);

    let report = controller.run_cycle().await;
    assert_eq!(report.demoted.len(), 1);
    assert_eq!(report.demoted[0].as_str(), "http://127.0.0.1:9");
    assert_eq!(pool.sizes(), (2, 1));
}

#[tokio::test]
async fn test_background_loop_scales_running_balancer() {
    let primary = spawn_workers(2).await;
    let standby = spawn_workers(1).await;
    set_all_cpu(&primary, 95);

    let mut config = config_for(&primary, &standby);
    config.autoscale.enabled = true;
    config.autoscale.interval_ms = 50;
    let lb = spawn_balancer(config).await;
    let client = client();

    let mut primary_len = 0;
    for _ in 0..40 {
        let pool: serde_json::Value = client
            .get(lb.endpoint("/pool"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        primary_len = pool["primary"].as_array().unwrap().len();
        if primary_len == 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(primary_len, 3);

    lb.shutdown.trigger();
}
