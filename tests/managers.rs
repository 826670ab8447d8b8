//! Resource managers driven against the in-memory daemon.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FakeDocker, drain, wait_until};
use dockdeck::docker::{DockerCli, DockerClient, NetworkSpec, ResourceType, VolumeSpec};
use dockdeck::resource::{Filters, Operation, ResourceEvent, ResourceKind, ResourceManager};
use dockdeck::resources::{ContainerManager, ImageManager, NetworkManager, VolumeManager};

fn manager<K: ResourceKind>(fake: &Arc<FakeDocker>) -> ResourceManager<K> {
    let client: Arc<dyn DockerClient> = Arc::clone(fake) as Arc<dyn DockerClient>;
    ResourceManager::with_default_ttl(client)
}

/// Poll until nothing is loading or in flight.
fn settle<K: ResourceKind>(m: &mut ResourceManager<K>) {
    wait_until(|| {
        m.poll();
        !m.is_busy()
    });
}

fn load<K: ResourceKind>(m: &mut ResourceManager<K>) {
    m.refresh(true);
    settle(m);
}

#[test]
fn refresh_loads_and_announces() {
    let fake = Arc::new(FakeDocker::new());
    let mut containers: ContainerManager = manager(&fake);
    let rx = containers.subscribe();

    containers.refresh(false);
    assert!(containers.is_loading());
    settle(&mut containers);

    assert_eq!(containers.resources().len(), 3);
    assert_eq!(containers.filtered().len(), 3);
    assert!(containers.is_cache_valid());

    let events = drain(&rx);
    assert_eq!(
        events[..2],
        [
            ResourceEvent::LoadingStarted(ResourceType::Container),
            ResourceEvent::LoadingComplete(ResourceType::Container),
        ]
    );

    // The coalesced redraw arrives after the debounce delay.
    let mut seen = events;
    wait_until(|| {
        containers.poll();
        seen.extend(drain(&rx));
        seen.contains(&ResourceEvent::UiUpdate(ResourceType::Container))
    });
}

#[test]
fn cache_answers_until_forced() {
    let fake = Arc::new(FakeDocker::new());
    let mut images: ImageManager = manager(&fake);
    load(&mut images);
    assert_eq!(fake.list_calls(), 1);

    let rx = images.subscribe();
    images.refresh(false);
    assert!(!images.is_loading());
    assert_eq!(drain(&rx), [ResourceEvent::CacheHit(ResourceType::Image)]);
    assert_eq!(fake.list_calls(), 1);

    images.refresh(true);
    settle(&mut images);
    assert_eq!(fake.list_calls(), 2);

    images.invalidate_cache();
    assert!(!images.is_cache_valid());
    images.refresh(false);
    settle(&mut images);
    assert_eq!(fake.list_calls(), 3);
}

#[test]
fn forced_refresh_during_load_runs_afterwards() {
    let fake = Arc::new(FakeDocker::new());
    let mut volumes: VolumeManager = manager(&fake);

    volumes.refresh(true);
    volumes.refresh(true);
    // A second non-forced request does not queue another load.
    volumes.refresh(false);
    settle(&mut volumes);

    assert_eq!(fake.list_calls(), 2);
    assert_eq!(volumes.resources().len(), 2);
}

#[test]
fn search_and_filters_narrow_the_view() {
    let fake = Arc::new(FakeDocker::new());
    let mut containers: ContainerManager = manager(&fake);
    load(&mut containers);

    containers.search("WEB");
    assert_eq!(containers.filtered().len(), 1);
    assert_eq!(containers.filtered()[0].name, "web");

    containers.clear_search();
    containers.filter(Filters::from([("status".to_string(), "running".to_string())]));
    assert_eq!(containers.filtered().len(), 2);

    containers.search("cache");
    assert_eq!(containers.filtered().len(), 1);

    containers.clear_filters();
    containers.clear_search();
    assert_eq!(containers.filtered().len(), 3);

    // Criteria survive a reload.
    containers.set_filter("status", "exited");
    load(&mut containers);
    assert_eq!(containers.filtered().len(), 1);
    assert_eq!(containers.filtered()[0].name, "db");

    containers.remove_filter("status");
    assert!(containers.filters().is_empty());
    assert_eq!(containers.filtered().len(), 3);
}

#[test]
fn delete_refreshes_the_list() {
    let fake = Arc::new(FakeDocker::new());
    let mut containers: ContainerManager = manager(&fake);
    load(&mut containers);
    let rx = containers.subscribe();

    containers.delete("c2bbbbbbbbbbbb");
    assert!(containers.is_busy());
    settle(&mut containers);

    assert_eq!(containers.resources().len(), 2);
    assert!(containers.get("c2bbbbbbbbbbbb").is_none());
    let events = drain(&rx);
    assert!(events.contains(&ResourceEvent::DeleteComplete {
        kind: ResourceType::Container,
        id: "c2bbbbbbbbbbbb".to_string(),
    }));
    assert!(events.contains(&ResourceEvent::LoadingComplete(ResourceType::Container)));
    assert!(fake.calls().contains(&"rm container c2bbbbbbbbbbbb force=true".to_string()));
}

#[test]
fn delete_failure_reports_daemon_message() {
    let fake = Arc::new(FakeDocker::new());
    fake.lock_id("sha256:1111111111111111");
    let mut images: ImageManager = manager(&fake);
    load(&mut images);
    let rx = images.subscribe();

    images.delete("sha256:1111111111111111");
    settle(&mut images);

    assert_eq!(images.resources().len(), 3);
    let events: Vec<_> = drain(&rx)
        .into_iter()
        .filter(|e| !matches!(e, ResourceEvent::UiUpdate(_)))
        .collect();
    assert_eq!(
        events,
        [ResourceEvent::DeleteError {
            kind: ResourceType::Image,
            id: "sha256:1111111111111111".to_string(),
            error: "image sha256:1111111111111111 is in use".to_string(),
        }]
    );
}

#[test]
fn networks_are_removed_without_force() {
    let fake = Arc::new(FakeDocker::new());
    let mut networks: NetworkManager = manager(&fake);
    load(&mut networks);

    networks.delete("n4");
    settle(&mut networks);
    assert!(fake.calls().contains(&"rm network n4 force=false".to_string()));
    assert_eq!(networks.counts().custom, 0);
    assert_eq!(networks.counts().builtin, 3);
    assert_eq!(networks.by_driver().get("bridge"), Some(&1));
}

#[test]
fn batch_delete_reports_partial_failure() {
    let fake = Arc::new(FakeDocker::new());
    fake.lock_id("c3cccccccccccc");
    let mut containers: ContainerManager = manager(&fake);
    load(&mut containers);
    let rx = containers.subscribe();

    containers.delete_many(vec!["c1aaaaaaaaaaaa".into(), "c3cccccccccccc".into()]);
    settle(&mut containers);

    // The successful half is gone after the automatic reload.
    assert_eq!(containers.resources().len(), 2);
    let error = drain(&rx)
        .into_iter()
        .find_map(|e| match e {
            ResourceEvent::OperationError {
                op: Operation::DeleteMany,
                error,
                ..
            } => Some(error),
            _ => None,
        })
        .expect("batch error event");
    assert!(error.starts_with("removed 1 of 2 containers"), "{error}");
    assert!(error.contains("c3cccccccccccc"), "{error}");
}

#[test]
fn lifecycle_operations_update_state() {
    let fake = Arc::new(FakeDocker::new());
    let mut containers: ContainerManager = manager(&fake);
    load(&mut containers);
    assert_eq!(containers.counts().running, 2);
    let rx = containers.subscribe();

    containers.stop("c1aaaaaaaaaaaa");
    settle(&mut containers);
    assert_eq!(containers.counts().running, 1);
    assert_eq!(containers.counts().stopped, 2);

    let events = drain(&rx);
    assert!(events.contains(&ResourceEvent::OperationStarted {
        kind: ResourceType::Container,
        op: Operation::Stop,
        target: "web".to_string(),
    }));
    assert!(events.contains(&ResourceEvent::OperationComplete {
        kind: ResourceType::Container,
        op: Operation::Stop,
        target: "web".to_string(),
        message: "container stopped".to_string(),
    }));

    containers.start("c2bbbbbbbbbbbb");
    containers.restart("c3cccccccccccc");
    settle(&mut containers);
    assert_eq!(containers.counts().running, 2);
}

#[test]
fn logs_and_stats_come_straight_from_the_client() {
    let fake = Arc::new(FakeDocker::new());
    let containers: ContainerManager = manager(&fake);
    assert_eq!(containers.logs("c1aaaaaaaaaaaa", 2).unwrap(), "line 1\nline 2\n");
    assert_eq!(containers.stats("c1aaaaaaaaaaaa").unwrap().pids, 4);
}

#[test]
fn pull_streams_progress_then_lists_the_image() {
    let fake = Arc::new(FakeDocker::new());
    let mut images: ImageManager = manager(&fake);
    load(&mut images);
    let rx = images.subscribe();

    let _token = images.pull(" alpine:3.20 ");
    settle(&mut images);

    let events = drain(&rx);
    let progress: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            ResourceEvent::Progress { line, .. } => Some(line.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(progress.len(), 3);
    assert!(events.contains(&ResourceEvent::OperationComplete {
        kind: ResourceType::Image,
        op: Operation::Pull,
        target: "alpine:3.20".to_string(),
        message: "pulled alpine:3.20".to_string(),
    }));
    assert!(
        images
            .resources()
            .iter()
            .any(|i| i.repo_tag().as_deref() == Some("alpine:3.20"))
    );
}

#[test]
fn tag_defaults_to_latest() {
    let fake = Arc::new(FakeDocker::new());
    let mut images: ImageManager = manager(&fake);
    load(&mut images);

    images.tag("sha256:2222222222222222", "registry.local/redis", "");
    settle(&mut images);
    assert!(
        fake.calls()
            .contains(&"tag sha256:2222222222222222 registry.local/redis:latest".to_string())
    );
    assert_eq!(images.resources().len(), 4);
}

#[test]
fn create_network_and_volume() {
    let fake = Arc::new(FakeDocker::new());
    let mut networks: NetworkManager = manager(&fake);
    let mut volumes: VolumeManager = manager(&fake);
    load(&mut networks);
    load(&mut volumes);

    networks.create(NetworkSpec::new("frontend"));
    volumes.create(VolumeSpec::new("uploads"));
    settle(&mut networks);
    settle(&mut volumes);
    assert_eq!(networks.counts().custom, 2);
    assert_eq!(volumes.counts().unused, 2);

    // A duplicate name fails and leaves the list untouched.
    let rx = networks.subscribe();
    networks.create(NetworkSpec::new("frontend"));
    settle(&mut networks);
    assert!(drain(&rx).iter().any(|e| matches!(
        e,
        ResourceEvent::OperationError { op: Operation::Create, error, .. }
            if error.contains("already exists")
    )));
    assert_eq!(networks.counts().custom, 2);
}

#[test]
fn prune_keeps_builtin_and_used_resources() {
    let fake = Arc::new(FakeDocker::new());
    let mut networks: NetworkManager = manager(&fake);
    let mut volumes: VolumeManager = manager(&fake);
    let mut images: ImageManager = manager(&fake);
    load(&mut networks);
    load(&mut volumes);
    load(&mut images);
    let rx = images.subscribe();

    networks.prune();
    volumes.prune();
    images.prune();
    settle(&mut networks);
    settle(&mut volumes);
    settle(&mut images);

    assert_eq!(networks.counts().total, 3);
    assert_eq!(volumes.counts().total, 1);
    assert_eq!(images.counts().dangling, 0);
    assert!(drain(&rx).iter().any(|e| matches!(
        e,
        ResourceEvent::OperationComplete { op: Operation::Prune, message, .. }
            if message.starts_with("removed 1 unused images")
    )));
}

#[test]
fn unreachable_daemon_is_a_loading_error() {
    let fake = Arc::new(FakeDocker::new());
    fake.set_offline(true);
    let mut volumes: VolumeManager = manager(&fake);
    let rx = volumes.subscribe();

    volumes.refresh(false);
    settle(&mut volumes);

    assert!(volumes.resources().is_empty());
    assert!(!volumes.is_cache_valid());
    assert!(
        drain(&rx)
            .iter()
            .any(|e| matches!(e, ResourceEvent::LoadingError { kind: ResourceType::Volume, .. }))
    );
}

#[test]
fn dropped_subscribers_are_pruned() {
    let fake = Arc::new(FakeDocker::new());
    let mut volumes: VolumeManager = manager(&fake);
    let kept = volumes.subscribe();
    drop(volumes.subscribe());

    load(&mut volumes);
    assert!(!drain(&kept).is_empty());
}

#[test]
fn short_ttl_expires() {
    let fake = Arc::new(FakeDocker::new());
    let client: Arc<dyn DockerClient> = fake.clone();
    let mut volumes = VolumeManager::new(client, Duration::from_millis(20));
    load(&mut volumes);
    assert!(volumes.is_cache_valid());
    std::thread::sleep(Duration::from_millis(40));
    assert!(!volumes.is_cache_valid());
}

#[cfg(unix)]
#[test]
fn hung_daemon_ends_the_load_with_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("docker.sh");
    std::fs::write(&script, "exec sleep 30\n").unwrap();
    let cli = DockerCli::from_command_line(&format!("sh '{}'", script.display()))
        .unwrap()
        .with_command_timeout(Duration::from_millis(200));
    let client: Arc<dyn DockerClient> = Arc::new(cli);
    let mut containers = ContainerManager::with_default_ttl(client);
    let rx = containers.subscribe();

    load(&mut containers);
    assert!(!containers.is_loading());
    assert!(drain(&rx).iter().any(|e| matches!(
        e,
        ResourceEvent::LoadingError { kind: ResourceType::Container, error }
            if error.contains("timed out")
    )));
}
