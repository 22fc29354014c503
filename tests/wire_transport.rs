//! Wire Transport Tests
//!
//! Drives the VM fakes the way an HTTP client would: follow the
//! `Azure-AsyncOperation` header until a terminal status, and follow
//! `nextLink` (or the retry link on a transient error) until it runs out.

mod fixtures;

use armfake::config::TransportSettings;
use armfake::fake::Resource;
use armfake::FakeTransport;
use armfake_wire::{
    AsyncOperationBody, Method, OperationStatus, PageBody, WireRequest, WireResponse,
};
use fixtures::{vm_path, vm_server, vms_path, RESOURCE_GROUP};

fn transport() -> FakeTransport<Resource> {
    FakeTransport::new(vm_server(), TransportSettings::default())
}

/// Poll until the operation status is terminal; returns every poll response.
fn poll_to_completion(t: &FakeTransport<Resource>, begin: &WireResponse) -> Vec<WireResponse> {
    let url = begin.header("Azure-AsyncOperation").expect("polling url").to_string();
    let mut responses = Vec::new();
    for _ in 0..10 {
        let resp = t.handle(&WireRequest::get(&url));
        let body: AsyncOperationBody = serde_json::from_value(resp.body.clone().unwrap()).unwrap();
        responses.push(resp);
        if body.status.is_terminal() {
            return responses;
        }
    }
    panic!("operation did not finish in 10 polls");
}

/// Follow links through the whole listing.
fn list_all(t: &FakeTransport<Resource>) -> (Vec<Resource>, usize, usize) {
    let mut items = Vec::new();
    let mut pages = 0;
    let mut errors = 0;
    let mut next = Some(vms_path());

    while let Some(url) = next.take() {
        let resp = t.handle(&WireRequest::get(&url));
        if resp.is_success() {
            let page: PageBody<Resource> = serde_json::from_value(resp.body.unwrap()).unwrap();
            pages += 1;
            items.extend(page.value);
            next = page.next_link;
        } else {
            errors += 1;
            next = resp.header("x-ms-fake-next-link").map(str::to_string);
        }
    }
    (items, pages, errors)
}

// =============================================================================
// Get
// =============================================================================

#[test]
fn test_get_over_the_wire() {
    let t = transport();
    let resp = t.handle(&WireRequest::get(&format!("https://fake.local{}", vm_path("virtualmachine1"))));

    assert_eq!(resp.status, 200);
    let vm: Resource = serde_json::from_value(resp.body.unwrap()).unwrap();
    assert_eq!(vm.name, "virtualmachine1");
    assert!(vm.id.contains(RESOURCE_GROUP));
    assert_eq!(vm.properties["location"], "westus");
}

// =============================================================================
// BeginDelete
// =============================================================================

#[test]
fn test_begin_delete_over_the_wire() {
    let t = transport();
    let begin = t.handle(&WireRequest::new(Method::Delete, &vm_path("virtualmachine1")));
    assert_eq!(begin.status, 202);
    assert_eq!(begin.header("Retry-After"), Some("0"));
    assert!(begin.body.is_none());

    let polls = poll_to_completion(&t, &begin);
    assert_eq!(polls.len(), 2);
    assert_eq!(polls[0].status, 202);

    let last = polls.last().unwrap();
    assert_eq!(last.status, 404);
    let body: AsyncOperationBody = serde_json::from_value(last.body.clone().unwrap()).unwrap();
    assert_eq!(body.status, OperationStatus::Failed);
    let error = body.error.unwrap();
    assert_eq!(error.code, "NotFound");
    assert!(error.message.contains("404"));

    assert_eq!(t.in_flight_pollers(), 0);
}

#[test]
fn test_concurrent_deletes_do_not_share_pollers() {
    let t = transport();
    let a = t.handle(&WireRequest::new(Method::Delete, &vm_path("a")));
    let b = t.handle(&WireRequest::new(Method::Delete, &vm_path("b")));
    assert_ne!(a.header("Azure-AsyncOperation"), b.header("Azure-AsyncOperation"));
    assert_eq!(t.in_flight_pollers(), 2);

    assert_eq!(poll_to_completion(&t, &a).len(), 2);
    assert_eq!(t.in_flight_pollers(), 1);
    assert_eq!(poll_to_completion(&t, &b).len(), 2);
}

// =============================================================================
// List
// =============================================================================

#[test]
fn test_list_over_the_wire() {
    let t = transport();
    let (items, pages, errors) = list_all(&t);

    assert_eq!(items.len(), 5);
    assert_eq!(pages, 2);
    assert_eq!(errors, 1);
    assert!(items.iter().all(|vm| vm.id.contains(RESOURCE_GROUP)));
    assert_eq!(t.in_flight_pagers(), 0);
}

#[test]
fn test_transport_shared_across_threads() {
    let t = transport();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let t = t.clone();
            std::thread::spawn(move || list_all(&t))
        })
        .collect();

    for handle in handles {
        let (items, pages, errors) = handle.join().unwrap();
        assert_eq!((items.len(), pages, errors), (5, 2, 1));
    }
}

// =============================================================================
// JSON lines
// =============================================================================

#[test]
fn test_json_lines_round_trip() {
    let t = transport();
    let line = r#"{"method":"GET","path":"/subscriptions/s/resourceGroups/rg2/providers/Microsoft.Compute/virtualMachines/vm3"}"#;

    let out: WireResponse = serde_json::from_str(&t.handle_json(line).unwrap()).unwrap();
    assert_eq!(out.status, 200);
    let vm = out.body.unwrap();
    assert_eq!(vm["name"], "vm3");
    assert!(vm["id"].as_str().unwrap().contains("/resourceGroups/rg2/"));
}
