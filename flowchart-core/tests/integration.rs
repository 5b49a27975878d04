//! Integration Tests for the Flowchart Engine
//!
//! These tests drive the public surface end to end: insertion, deletion,
//! links, mentions, edge edits and shared access.

use flowchart_core::{Error, Flowchart, FlowchartConfig, NodeContent, NodeId, SharedFlowchart};

fn chart() -> Flowchart {
    Flowchart::with_title("Test")
}

/// Test that a node with no connections hangs straight from Top to Bottom.
#[test]
fn lone_insert_sits_between_sentinels() {
    let mut chart = chart();
    let a = chart.add_node(NodeContent::Plain, &[], &[]).unwrap();

    let inbound: Vec<NodeId> = chart.inbound(a).unwrap().iter().copied().collect();
    let outbound: Vec<NodeId> = chart.outbound(a).unwrap().iter().copied().collect();

    assert_eq!(inbound, vec![NodeId::TOP]);
    assert_eq!(outbound, vec![NodeId::BOTTOM]);
    assert_eq!(chart.height(a).unwrap(), 1);
}

/// Test that a node looping back to its parent takes over the parent's
/// Top edge.
#[test]
fn loop_back_insert_retires_parent_top_edge() {
    let mut chart = chart();
    let a = chart.add_node(NodeContent::Plain, &[], &[]).unwrap();
    let b = chart.add_node(NodeContent::Plain, &[a], &[a]).unwrap();

    assert!(chart.has_edge(a, b));
    assert!(chart.has_edge(b, a));
    assert!(!chart.has_edge(NodeId::TOP, a));

    // Both nodes still hang from Top and drain into Bottom.
    assert!(chart.has_edge(NodeId::TOP, b));
    assert!(chart.has_edge(b, NodeId::BOTTOM));
}

/// Test that inserting between two connected nodes intercepts their edge.
#[test]
fn insert_between_intercepts_edge() {
    let mut chart = chart();
    let a = chart.add_node(NodeContent::Plain, &[], &[]).unwrap();
    let b = chart.add_node(NodeContent::Plain, &[a], &[]).unwrap();
    assert_eq!(chart.height(b).unwrap(), 2);

    let c = chart.add_node(NodeContent::Plain, &[a], &[b]).unwrap();

    assert!(!chart.has_edge(a, b));
    assert!(chart.has_edge(a, c));
    assert!(chart.has_edge(c, b));
    assert_eq!(chart.height(c).unwrap(), chart.height(a).unwrap() + 1);
    assert_eq!(chart.height(b).unwrap(), chart.height(c).unwrap() + 1);
}

/// Test that linking moves the shallower node down, never the deeper one up.
#[test]
fn link_moves_shallower_node_down() {
    let mut chart = chart();
    let r = chart.add_node(NodeContent::Plain, &[], &[]).unwrap();
    let x = chart.add_node(NodeContent::Plain, &[r], &[]).unwrap();
    let mut y = r;
    for _ in 0..4 {
        y = chart.add_node(NodeContent::Plain, &[y], &[]).unwrap();
    }
    chart.disconnect(r, x).unwrap();
    assert_eq!(chart.height(x).unwrap(), 2);
    assert_eq!(chart.height(y).unwrap(), 5);

    assert!(chart.link(x, y).unwrap());

    assert_eq!(chart.height(x).unwrap(), 5);
    assert_eq!(chart.height(y).unwrap(), 5);
    assert!(chart.has_link(x, y) && chart.has_link(y, x));

    // Deleting either one leaves the other where it is.
    let mut without_y = chart.clone();
    chart.delete(x).unwrap();
    assert_eq!(chart.height(y).unwrap(), 5);
    without_y.delete(y).unwrap();
    assert_eq!(without_y.height(x).unwrap(), 5);
    assert!(without_y.linked(x).unwrap().is_empty());
}

/// Test that deleting a node with two parents and two children draws every
/// bridge that was missing and leaves nothing pointing at it.
#[test]
fn delete_draws_missing_bridges() {
    let mut chart = chart();
    let p1 = chart.add_node(NodeContent::Plain, &[], &[]).unwrap();
    let p2 = chart.add_node(NodeContent::Plain, &[], &[]).unwrap();
    let c1 = chart.add_node(NodeContent::Plain, &[p1], &[]).unwrap();
    let c2 = chart.add_node(NodeContent::Plain, &[p2], &[]).unwrap();
    let n = chart.add_node(NodeContent::Plain, &[p1, p2], &[c1, c2]).unwrap();
    chart.mention(c1, n).unwrap();
    chart.connect(p1, c2).unwrap();

    let edges_before: usize = chart.nodes().map(|id| chart.outbound(id).unwrap().len()).sum();
    chart.delete(n).unwrap();

    for parent in [p1, p2] {
        for child in [c1, c2] {
            assert!(chart.has_edge(parent, child), "{parent} -> {child} missing");
        }
    }
    for id in chart.nodes() {
        let record = chart.record(id).unwrap();
        assert!(!record.inbound().contains(&n));
        assert!(!record.outbound().contains(&n));
        assert!(!record.linked().contains(&n));
        assert!(!record.mentions().contains(&n));
    }

    // Four edges around n are gone; three bridges were missing.
    let edges_after: usize = chart.nodes().map(|id| chart.outbound(id).unwrap().len()).sum();
    assert_eq!(edges_after, edges_before - 4 + 3);
}

/// Test that the same shape built twice gives the same dump.
#[test]
fn mutations_are_deterministic() {
    fn build() -> String {
        let mut chart = chart();
        let a = chart.add_node(NodeContent::label("a"), &[], &[]).unwrap();
        let b = chart.add_node(NodeContent::label("b"), &[a], &[]).unwrap();
        let c = chart.add_node(NodeContent::label("c"), &[a], &[b]).unwrap();
        let d = chart.add_node(NodeContent::label("d"), &[], &[]).unwrap();
        chart.link(d, c).unwrap();
        chart.mention(d, a).unwrap();
        chart.to_string()
    }

    assert_eq!(build(), build());
}

/// Test the dump layout.
#[test]
fn dump_shows_relations() {
    let mut chart = chart();
    let a = chart.add_node(NodeContent::Plain, &[], &[]).unwrap();
    let b = chart.add_node(NodeContent::Plain, &[], &[]).unwrap();
    chart.link(a, b).unwrap();
    chart.mention(a, b).unwrap();

    let dump = chart.to_string();

    assert!(dump.starts_with("Test\n"));
    assert!(dump.contains(&format!("Top (0,0) \t In: {{}} Out: {{{a}, {b}}} Lnk: {{}} Mnt: {{}}")));
    assert!(dump.contains(&format!("{a} (1,0) \t In: {{Top}} Out: {{Bot}} Lnk: {{{b}}} Mnt: {{{b}}}")));
}

/// Test that mentions stay structurally inert.
#[test]
fn mentions_do_not_move_anything() {
    let mut chart = chart();
    let a = chart.add_node(NodeContent::Plain, &[], &[]).unwrap();
    let b = chart.add_node(NodeContent::Plain, &[a], &[]).unwrap();

    assert!(chart.mention(b, a).unwrap());
    assert!(!chart.mention(b, a).unwrap());

    assert_eq!(chart.mentions_of(a).unwrap(), vec![b]);
    assert_eq!(chart.height(a).unwrap(), 1);
    assert_eq!(chart.height(b).unwrap(), 2);

    assert!(chart.unmention(b, a).unwrap());
    assert!(chart.mentions_of(a).unwrap().is_empty());
}

/// Test that a link whose leveling would drag an ancestor is refused.
#[test]
fn link_across_an_edge_is_refused() {
    let mut chart = chart();
    let a = chart.add_node(NodeContent::Plain, &[], &[]).unwrap();
    let b = chart.add_node(NodeContent::Plain, &[a], &[]).unwrap();
    let before = chart.to_string();

    assert_eq!(
        chart.link(a, b),
        Err(Error::HeightConflict { node: a, anchor: b })
    );
    assert_eq!(chart.to_string(), before);
}

/// Test that linked nodes move as one when something is inserted above
/// either of them.
#[test]
fn linked_nodes_move_together_on_insert() {
    let mut chart = chart();
    let a = chart.add_node(NodeContent::Plain, &[], &[]).unwrap();
    let b = chart.add_node(NodeContent::Plain, &[], &[]).unwrap();
    chart.link(a, b).unwrap();

    let top = chart.add_node(NodeContent::Plain, &[], &[a]).unwrap();

    assert_eq!(chart.height(top).unwrap(), 1);
    assert_eq!(chart.height(a).unwrap(), 2);
    assert_eq!(chart.height(b).unwrap(), 2);
}

/// Test that lookups by raw id go through the chart.
#[test]
fn lookup_by_raw_id() {
    let mut chart = chart();
    let a = chart.add_node(NodeContent::label("start"), &[], &[]).unwrap();

    assert_eq!(chart.lookup(a.raw()).unwrap(), a);
    assert_eq!(chart.lookup(0).unwrap(), NodeId::TOP);
    assert_eq!(chart.lookup(42), Err(Error::UnknownNode(NodeId::from(42))));
    assert_eq!(chart.payload(a).and_then(NodeContent::label_text), Some("start"));
}

/// Test that independent charts mint ids independently.
#[test]
fn charts_do_not_share_ids() {
    let mut first = chart();
    let mut second: Flowchart = Flowchart::with_config(FlowchartConfig::new().with_capacity(4));

    let a = first.add_node(NodeContent::Plain, &[], &[]).unwrap();
    let b = second.add_node(NodeContent::Plain, &[], &[]).unwrap();

    assert_eq!(a, b);
    assert_eq!(second.title(), "Flowchart");
}

/// Test that ranks are stored and shown but never touched by the engine.
#[test]
fn ranks_are_carried_through() {
    let mut chart = chart();
    let a = chart.add_node(NodeContent::Plain, &[], &[]).unwrap();
    chart.set_rank(a, 3).unwrap();

    chart.add_node(NodeContent::Plain, &[], &[a]).unwrap();

    assert_eq!(chart.rank(a).unwrap(), 3);
    assert_eq!(chart.height(a).unwrap(), 2);
}

/// Test that a shared chart serializes writers.
#[test]
fn shared_chart_builds_a_chain() {
    let shared = SharedFlowchart::from(chart());
    let first = shared
        .mutate(|chart| chart.add_node(NodeContent::Plain, &[], &[]))
        .unwrap();

    let handles: Vec<_> = (0..3)
        .map(|_| {
            let shared = shared.clone();
            std::thread::spawn(move || {
                shared
                    .mutate(|chart| chart.add_node(NodeContent::Plain, &[first], &[]))
                    .unwrap()
            })
        })
        .collect();
    let children: Vec<NodeId> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    shared.query(|chart| {
        for child in &children {
            assert_eq!(chart.height(*child).unwrap(), 2);
            assert!(chart.has_edge(first, *child));
        }
        assert!(!chart.has_edge(first, NodeId::BOTTOM));
    });
}
