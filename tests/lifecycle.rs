//! Stateful component lifecycle: mount order, updates, unmounting.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{harness, Harness, Log};
use rstest::rstest;
use serde_json::{json, Value};
use spark_vdom::{
    object_to_map, Component, ComponentClass, HookKind, HookResult, Props, ReconcileError, Scope,
    State, Updater, VNode,
};

// =============================================================================
// Components
// =============================================================================

/// Renders `<div>{name}</div>` and logs its unmount.
struct Leaf {
    name: &'static str,
    log: Log,
}

impl Component for Leaf {
    fn render(&self, _scope: &Scope<'_>) -> Option<VNode> {
        Some(VNode::element("div").child(VNode::text(self.name)))
    }

    fn component_will_unmount(&mut self, _scope: &mut Scope<'_>) -> HookResult {
        self.log.push(self.name);
        Ok(())
    }
}

fn leaf(name: &'static str, log: &Log) -> ComponentClass {
    let log = log.clone();
    ComponentClass::new(name, move |_| Leaf {
        name,
        log: log.clone(),
    })
}

/// Shows one of three leaves depending on `state.show`, keeping its updater
/// so the test can drive it.
struct Switcher {
    leaves: [ComponentClass; 3],
    wrap: bool,
    handle: Rc<RefCell<Option<Updater>>>,
}

impl Component for Switcher {
    fn initial_state(&self, _props: &Props) -> State {
        object_to_map(json!({ "show": 0 }))
    }

    fn component_will_mount(&mut self, scope: &mut Scope<'_>) -> HookResult {
        *self.handle.borrow_mut() = Some(scope.updater());
        Ok(())
    }

    fn render(&self, scope: &Scope<'_>) -> Option<VNode> {
        let index = scope.state_value("show").and_then(Value::as_u64).unwrap_or(0) as usize;
        let shown = self.leaves.get(index).map(VNode::component);
        if !self.wrap {
            return shown;
        }
        Some(
            VNode::element("div")
                .child_opt(shown)
                .child(VNode::element("button").child(VNode::text("btn"))),
        )
    }
}

fn switcher(log: &Log, wrap: bool) -> (ComponentClass, Rc<RefCell<Option<Updater>>>) {
    let leaves = [leaf("B", log), leaf("C", log), leaf("D", log)];
    let handle = Rc::new(RefCell::new(None));
    let slot = handle.clone();
    let class = ComponentClass::new("A", move |_| Switcher {
        leaves: leaves.clone(),
        wrap,
        handle: slot.clone(),
    });
    (class, handle)
}

fn show(handle: &Rc<RefCell<Option<Updater>>>, index: u64) {
    let updater = handle.borrow().clone().unwrap();
    updater.set_state_sync(json!({ "show": index })).unwrap();
}

// =============================================================================
// Unmounting
// =============================================================================

#[rstest]
fn test_unmount_once_when_switching_nested_children(harness: Harness) {
    let log = Log::default();
    let (a, handle) = switcher(&log, true);

    harness.renderer.render(Some(VNode::component(&a)), harness.root).unwrap();
    assert_eq!(harness.html(), "<div><div>B</div><button>btn</button></div>");
    assert!(log.entries().is_empty());

    show(&handle, 1);
    assert_eq!(harness.html(), "<div><div>C</div><button>btn</button></div>");
    assert_eq!(log.entries(), vec!["B"]);

    show(&handle, 2);
    assert_eq!(harness.html(), "<div><div>D</div><button>btn</button></div>");
    assert_eq!(log.entries(), vec!["B", "C"]);

    // Out of range renders an empty slot.
    show(&handle, 9);
    assert_eq!(harness.html(), "<div><button>btn</button></div>");
    assert_eq!(log.entries(), vec!["B", "C", "D"]);

    show(&handle, 0);
    assert_eq!(harness.html(), "<div><div>B</div><button>btn</button></div>");
    assert_eq!(log.entries(), vec!["B", "C", "D"]);

    harness.renderer.render(None, harness.root).unwrap();
    assert_eq!(harness.html(), "");
    assert_eq!(log.entries(), vec!["B", "C", "D", "B"]);
}

#[rstest]
fn test_unmount_once_when_component_replaces_its_root(harness: Harness) {
    let log = Log::default();
    let (a, handle) = switcher(&log, false);

    harness.renderer.render(Some(VNode::component(&a)), harness.root).unwrap();
    assert_eq!(harness.html(), "<div>B</div>");

    show(&handle, 1);
    assert_eq!(harness.html(), "<div>C</div>");
    show(&handle, 2);
    assert_eq!(harness.html(), "<div>D</div>");
    show(&handle, 0);
    assert_eq!(harness.html(), "<div>B</div>");
    assert_eq!(log.entries(), vec!["B", "C", "D"]);

    harness.renderer.render(None, harness.root).unwrap();
    assert_eq!(log.entries(), vec!["B", "C", "D", "B"]);
}

#[rstest]
fn test_unmount_once_when_root_changes_type(harness: Harness) {
    let log = Log::default();
    let (b, c, d) = (leaf("B", &log), leaf("C", &log), leaf("D", &log));

    for (class, expected) in [(&b, "<div>B</div>"), (&c, "<div>C</div>"), (&d, "<div>D</div>")] {
        harness
            .renderer
            .render(Some(VNode::component(class)), harness.root)
            .unwrap();
        assert_eq!(harness.html(), expected);
    }
    harness.renderer.render(Some(VNode::component(&b)), harness.root).unwrap();

    assert_eq!(log.entries(), vec!["B", "C", "D"]);
}

/// Renders its two child classes inside a div.
struct Pair {
    log: Log,
    first: ComponentClass,
    second: ComponentClass,
}

impl Component for Pair {
    fn render(&self, _scope: &Scope<'_>) -> Option<VNode> {
        Some(
            VNode::element("div")
                .child(VNode::component(&self.first))
                .child(VNode::component(&self.second)),
        )
    }

    fn component_will_unmount(&mut self, _scope: &mut Scope<'_>) -> HookResult {
        self.log.push("B");
        Ok(())
    }
}

#[rstest]
fn test_unmount_runs_parent_first_for_nested_components(harness: Harness) {
    let log = Log::default();
    let (b1, b2, c) = (leaf("B1", &log), leaf("B2", &log), leaf("C", &log));
    let pair_log = log.clone();
    let b = ComponentClass::new("B", move |_| Pair {
        log: pair_log.clone(),
        first: b1.clone(),
        second: b2.clone(),
    });

    harness.renderer.render(Some(VNode::component(&b)), harness.root).unwrap();
    assert_eq!(harness.html(), "<div><div>B1</div><div>B2</div></div>");

    harness.renderer.render(Some(VNode::component(&c)), harness.root).unwrap();
    assert_eq!(harness.html(), "<div>C</div>");
    assert_eq!(log.entries(), vec!["B", "B1", "B2"]);
}

/// `<div>{name}{child}</div>`, logging its unmount.
struct Nest {
    name: &'static str,
    log: Log,
    child: Option<ComponentClass>,
}

impl Component for Nest {
    fn render(&self, _scope: &Scope<'_>) -> Option<VNode> {
        Some(
            VNode::element("div")
                .child(VNode::text(self.name))
                .child_opt(self.child.as_ref().map(VNode::component)),
        )
    }

    fn component_will_unmount(&mut self, _scope: &mut Scope<'_>) -> HookResult {
        self.log.push(format!("{} unmount", self.name));
        Ok(())
    }
}

fn nest(name: &'static str, log: &Log, child: Option<ComponentClass>) -> ComponentClass {
    let log = log.clone();
    ComponentClass::new(name, move |_| Nest {
        name,
        log: log.clone(),
        child: child.clone(),
    })
}

/// `<div>A{show && <B/>}</div>`, toggled through `state.show`.
struct Toggle {
    child: ComponentClass,
    handle: Rc<RefCell<Option<Updater>>>,
}

impl Component for Toggle {
    fn component_will_mount(&mut self, scope: &mut Scope<'_>) -> HookResult {
        *self.handle.borrow_mut() = Some(scope.updater());
        Ok(())
    }

    fn render(&self, scope: &Scope<'_>) -> Option<VNode> {
        let show = scope.state_value("show").and_then(Value::as_bool).unwrap_or(false);
        Some(
            VNode::element("div")
                .child(VNode::text("A"))
                .child_opt(show.then(|| VNode::component(&self.child))),
        )
    }
}

#[rstest]
fn test_unmount_once_for_deep_chain(harness: Harness) {
    let log = Log::default();
    let d = nest("D", &log, None);
    let c = nest("C", &log, Some(d));
    let b = nest("B", &log, Some(c));
    let handle = Rc::new(RefCell::new(None));
    let slot = handle.clone();
    let a = ComponentClass::new("A", move |_| Toggle {
        child: b.clone(),
        handle: slot.clone(),
    });
    let toggle = |show: bool| {
        let updater: Updater = handle.borrow().clone().unwrap();
        updater.set_state_sync(json!({ "show": show })).unwrap();
    };
    let chain = "<div>A<div>B<div>C<div>D</div></div></div></div>";

    harness.renderer.render(Some(VNode::component(&a)), harness.root).unwrap();
    assert_eq!(harness.html(), "<div>A</div>");

    for _ in 0..2 {
        toggle(true);
        assert_eq!(harness.html(), chain);
        assert!(log.take().is_empty());

        toggle(false);
        assert_eq!(harness.html(), "<div>A</div>");
        assert_eq!(log.take(), vec!["B unmount", "C unmount", "D unmount"]);
    }

    toggle(true);
    harness.renderer.render(None, harness.root).unwrap();
    assert_eq!(log.take(), vec!["B unmount", "C unmount", "D unmount"]);
    assert_eq!(harness.html(), "");
}

#[rstest]
fn test_component_inside_swapped_function_is_remounted(harness: Harness) {
    let log = Log::default();
    let com = leaf("Com", &log);
    let wrap = |name: &'static str| {
        let com = com.clone();
        spark_vdom::FunctionComponent::new(name, move |_, _, _| {
            Some(VNode::element("div").child(VNode::component(&com)))
        })
    };
    let (fa, fb) = (wrap("FA"), wrap("FB"));

    harness.renderer.render(Some(VNode::function(&fa)), harness.root).unwrap();
    assert_eq!(harness.html(), "<div><div>Com</div></div>");
    harness.renderer.render(Some(VNode::function(&fa)), harness.root).unwrap();
    assert!(log.entries().is_empty());

    harness.renderer.render(Some(VNode::function(&fb)), harness.root).unwrap();
    assert_eq!(harness.html(), "<div><div>Com</div></div>");
    assert_eq!(log.entries(), vec!["Com"]);
}

// =============================================================================
// Mount and update order
// =============================================================================

/// Logs every hook it sees, prefixed with its name.
struct Tracer {
    name: &'static str,
    log: Log,
    child: Option<ComponentClass>,
}

impl Component for Tracer {
    fn render(&self, scope: &Scope<'_>) -> Option<VNode> {
        self.log.push(format!("{} render", self.name));
        let label = scope
            .prop("label")
            .and_then(Value::as_str)
            .unwrap_or(self.name)
            .to_string();
        let mut node = VNode::element("section").child(VNode::text(label.clone()));
        if let Some(child) = &self.child {
            node = node.child(VNode::component(child).prop("label", label));
        }
        Some(node)
    }

    fn component_will_mount(&mut self, _scope: &mut Scope<'_>) -> HookResult {
        self.log.push(format!("{} willMount", self.name));
        Ok(())
    }

    fn component_did_mount(&mut self, scope: &mut Scope<'_>) -> HookResult {
        assert!(scope.node().is_some());
        self.log.push(format!("{} didMount", self.name));
        Ok(())
    }

    fn component_will_receive_props(
        &mut self,
        _scope: &mut Scope<'_>,
        _next_props: &Props,
    ) -> HookResult {
        self.log.push(format!("{} willReceiveProps", self.name));
        Ok(())
    }

    fn component_will_update(
        &mut self,
        _scope: &mut Scope<'_>,
        _next_props: &Props,
        _next_state: &State,
    ) -> HookResult {
        self.log.push(format!("{} willUpdate", self.name));
        Ok(())
    }

    fn component_did_update(
        &mut self,
        _scope: &mut Scope<'_>,
        _prev_props: &Props,
        _prev_state: &State,
    ) -> HookResult {
        self.log.push(format!("{} didUpdate", self.name));
        Ok(())
    }

    fn component_will_unmount(&mut self, _scope: &mut Scope<'_>) -> HookResult {
        self.log.push(format!("{} willUnmount", self.name));
        Ok(())
    }
}

fn tracer_pair(log: &Log) -> ComponentClass {
    let child_log = log.clone();
    let child = ComponentClass::new("Child", move |_| Tracer {
        name: "child",
        log: child_log.clone(),
        child: None,
    });
    let parent_log = log.clone();
    ComponentClass::new("Parent", move |_| Tracer {
        name: "parent",
        log: parent_log.clone(),
        child: Some(child.clone()),
    })
}

#[rstest]
fn test_mount_update_unmount_order(harness: Harness) {
    let log = Log::default();
    let parent = tracer_pair(&log);

    harness
        .renderer
        .render(Some(VNode::component(&parent).prop("label", "one")), harness.root)
        .unwrap();
    assert_eq!(
        harness.html(),
        "<section>one<section>one</section></section>"
    );
    assert_eq!(
        log.take(),
        vec![
            "parent willMount",
            "parent render",
            "child willMount",
            "child render",
            "child didMount",
            "parent didMount",
        ]
    );

    harness
        .renderer
        .render(Some(VNode::component(&parent).prop("label", "two")), harness.root)
        .unwrap();
    assert_eq!(
        harness.html(),
        "<section>two<section>two</section></section>"
    );
    assert_eq!(
        log.take(),
        vec![
            "parent willReceiveProps",
            "parent willUpdate",
            "parent render",
            "child willReceiveProps",
            "child willUpdate",
            "child render",
            "child didUpdate",
            "parent didUpdate",
        ]
    );

    harness.renderer.render(None, harness.root).unwrap();
    assert_eq!(log.take(), vec!["parent willUnmount", "child willUnmount"]);
}

// =============================================================================
// State
// =============================================================================

/// Copies `props.value` into state when props arrive and can refuse updates.
struct Mirror {
    renders: Rc<RefCell<usize>>,
    allow: bool,
    handle: Rc<RefCell<Option<Updater>>>,
}

impl Component for Mirror {
    fn initial_state(&self, props: &Props) -> State {
        let mut state = State::new();
        state.insert("seen".into(), props.get("value").cloned().unwrap_or(Value::Null));
        state
    }

    fn component_will_mount(&mut self, scope: &mut Scope<'_>) -> HookResult {
        *self.handle.borrow_mut() = Some(scope.updater());
        Ok(())
    }

    fn component_will_receive_props(
        &mut self,
        scope: &mut Scope<'_>,
        next_props: &Props,
    ) -> HookResult {
        let value = next_props.get("value").cloned().unwrap_or(Value::Null);
        scope.set_state(json!({ "seen": value }));
        Ok(())
    }

    fn should_component_update(
        &mut self,
        _scope: &mut Scope<'_>,
        _next_props: &Props,
        _next_state: &State,
    ) -> Result<bool, spark_vdom::HookError> {
        Ok(self.allow)
    }

    fn render(&self, scope: &Scope<'_>) -> Option<VNode> {
        *self.renders.borrow_mut() += 1;
        let seen = scope.state_value("seen").cloned().unwrap_or(Value::Null);
        Some(VNode::element("b").child(VNode::text(seen.to_string())))
    }
}

fn mirror(allow: bool) -> (ComponentClass, Rc<RefCell<usize>>, Rc<RefCell<Option<Updater>>>) {
    let renders = Rc::new(RefCell::new(0));
    let handle = Rc::new(RefCell::new(None));
    let (r, h) = (renders.clone(), handle.clone());
    let class = ComponentClass::new("Mirror", move |_| Mirror {
        renders: r.clone(),
        allow,
        handle: h.clone(),
    });
    (class, renders, handle)
}

#[rstest]
fn test_will_receive_props_state_is_seen_by_render(harness: Harness) {
    let (class, renders, _) = mirror(true);

    harness
        .renderer
        .render(Some(VNode::component(&class).prop("value", 1)), harness.root)
        .unwrap();
    assert_eq!(harness.html(), "<b>1</b>");

    harness
        .renderer
        .render(Some(VNode::component(&class).prop("value", 2)), harness.root)
        .unwrap();
    assert_eq!(harness.html(), "<b>2</b>");
    assert_eq!(*renders.borrow(), 2);
    // willReceiveProps merged in place: no extra pass was queued.
    assert!(!harness.renderer.has_pending());
}

#[rstest]
fn test_force_update_bypasses_should_update(harness: Harness) {
    let (class, renders, handle) = mirror(false);

    harness
        .renderer
        .render(Some(VNode::component(&class).prop("value", 1)), harness.root)
        .unwrap();
    let updater = handle.borrow().clone().unwrap();

    updater.set_state_sync(json!({ "seen": "x" })).unwrap();
    assert_eq!(*renders.borrow(), 1);
    assert_eq!(harness.html(), "<b>1</b>");

    // The refused state was still committed.
    updater.force_update().unwrap();
    assert_eq!(*renders.borrow(), 2);
    assert_eq!(harness.html(), "<b>\"x\"</b>");
}

// =============================================================================
// Errors
// =============================================================================

struct Failing;

impl Component for Failing {
    fn component_will_mount(&mut self, _scope: &mut Scope<'_>) -> HookResult {
        Err("no mounting today".into())
    }

    fn render(&self, _scope: &Scope<'_>) -> Option<VNode> {
        Some(VNode::element("div"))
    }
}

#[rstest]
fn test_hook_error_aborts_render(harness: Harness) {
    let class = ComponentClass::new("Failing", |_| Failing);

    let err = harness
        .renderer
        .render(Some(VNode::component(&class)), harness.root)
        .unwrap_err();

    assert!(matches!(err, ReconcileError::Hook { component: "Failing", .. }));
    assert_eq!(err.hook_kind(), Some(HookKind::WillMount));
    assert_eq!(
        err.to_string(),
        "componentWillMount of `Failing` failed: no mounting today"
    );
    assert!(!harness.renderer.is_rendering());
    assert!(!harness.renderer.is_mounted(harness.root));

    // The renderer stays usable.
    harness
        .renderer
        .render(Some(VNode::element("p")), harness.root)
        .unwrap();
    assert_eq!(harness.html(), "<p></p>");
}
