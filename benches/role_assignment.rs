//! Benchmarks for OSD device assignment and role topology resolution
//!
//! Target: a 500-node inventory build well under the MAAS round-trip time

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use maas_inventory::{assign, Config, InventoryBuilder, NetworkConfig, Node, TopologyResolver};
use serde_json::json;

fn storage_node(i: usize, data: usize, journal: usize) -> Node {
    let mut drives = Vec::new();
    for d in 0..data {
        drives.push(json!({
            "name": format!("sd{}", d),
            "id_path": format!("/dev/disk/by-id/wwn-data-{}-{}", i, d),
            "resource_uri": format!("/MAAS/api/1.0/nodes/node-{}/blockdevices/{}/", i, d),
            "tags": ["ansible_osd_data"],
            "size": 4_000_000_000_000u64,
            "used_for": "Unused",
        }));
    }
    for j in 0..journal {
        drives.push(json!({
            "name": format!("nvme{}n1", j),
            "id_path": format!("/dev/disk/by-id/nvme-journal-{}-{}", i, j),
            "resource_uri": format!("/MAAS/api/1.0/nodes/node-{}/blockdevices/{}/", i, 100 + j),
            "tags": ["ansible_osd_journal"],
            "size": 400_000_000_000u64,
            "used_for": "Unused",
        }));
    }

    let iface = |name: &str, link_id: u64, fabric: &str, cidr: &str| {
        json!({
            "name": name,
            "mac_address": format!("52:54:00:{:02x}:{:02x}:{:02x}", i / 256, i % 256, link_id),
            "resource_uri": format!("/MAAS/api/1.0/nodes/node-{}/interfaces/{}/", i, link_id),
            "links": [{
                "id": link_id,
                "mode": "auto",
                "ip_address": null,
                "subnet": {"id": link_id, "cidr": cidr, "vlan": {"fabric": fabric}},
            }],
        })
    };

    Node::from_record(json!({
        "system_id": format!("node-{}", i),
        "hostname": format!("osd-{:03}.maas", i),
        "tag_names": ["ansible_osds"],
        "power_type": "ipmi",
        "osystem": "ubuntu",
        "distro_series": "jammy",
        "macaddress_set": [{"mac_address": format!("52:54:00:00:{:02x}:{:02x}", i / 256, i % 256)}],
        "pxe_mac": null,
        "interface_set": [
            iface("eth0", 1, "fabric-0", "10.40.0.0/24"),
            iface("eth1", 2, "client_net", "10.0.0.0/24"),
            iface("eth2", 3, "cluster_net", "10.0.1.0/24"),
        ],
        "physicalblockdevice_set": drives,
        "substatus_name": "Deployed",
    }))
    .expect("benchmark node record is valid")
}

fn bench_assign(c: &mut Criterion) {
    let mut group = c.benchmark_group("role_assignment");
    group.throughput(Throughput::Elements(1));

    for (data, journal) in [(12usize, 2usize), (24, 4), (60, 7)] {
        let data_devs: Vec<String> = (0..data).map(|d| format!("/dev/sd{}", d)).collect();
        let journal_devs: Vec<String> = (0..journal).map(|j| format!("/dev/nvme{}n1", j)).collect();

        group.bench_with_input(
            BenchmarkId::new("assign", format!("{}x{}", data, journal)),
            &(data_devs, journal_devs),
            |b, (data_devs, journal_devs)| {
                b.iter(|| assign(black_box(data_devs.clone()), black_box(journal_devs.clone())));
            },
        );
    }

    group.finish();
}

fn bench_resolve_role_vars(c: &mut Criterion) {
    let mut group = c.benchmark_group("role_assignment");

    let nodes: Vec<Node> = (0..500).map(|i| storage_node(i, 12, 2)).collect();
    let refs: Vec<&Node> = nodes.iter().collect();
    let resolver = TopologyResolver::new(&NetworkConfig::default());

    group.throughput(Throughput::Elements(refs.len() as u64));
    group.bench_function("resolve_osds_500", |b| {
        b.iter(|| resolver.resolve_role_vars(black_box("osds"), black_box(&refs)));
    });

    group.finish();
}

fn bench_inventory_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("role_assignment");

    let nodes: Vec<Node> = (0..500).map(|i| storage_node(i, 12, 2)).collect();
    let builder = InventoryBuilder::new(&Config::default());

    group.throughput(Throughput::Elements(nodes.len() as u64));
    group.bench_function("build_inventory_500", |b| {
        b.iter(|| builder.build(black_box(&nodes)));
    });

    group.finish();
}

criterion_group!(benches, bench_assign, bench_resolve_role_vars, bench_inventory_build);
criterion_main!(benches);
