//! End-to-end tests for `morph`: identity preservation, hooks, blocks,
//! lookahead, teleports and host collaboration.

mod common;

use std::cell::{Cell, RefCell};

use espalier::{
    Document, Host, MorphError, MorphOptions, NodeId, ScopeId, Side, morph, morph_with_host,
    parse_document, parse_fragment,
};

/// Parse `html` as body content and return its first element.
fn live(html: &str) -> (Document, NodeId) {
    let doc = parse_fragment(html);
    let root = doc.first_element_child(doc.root).expect("fragment has an element");
    (doc, root)
}

fn children(doc: &Document, id: NodeId) -> Vec<NodeId> {
    doc.children(id).collect()
}

#[test]
fn morphing_into_own_markup_changes_nothing() {
    common::setup();
    let html = r#"<div id="app" class="x"><ul><li key="a">A</li><li key="b">B <b>bold</b></li></ul><!-- note --><p>text</p></div>"#;
    let (mut doc, root) = live(html);
    let before: Vec<NodeId> = root.descendants(&doc.arena).collect();

    let added = Cell::new(0);
    let removed = Cell::new(0);
    let updated = Cell::new(0);
    let options = MorphOptions::new()
        .added(|_| added.set(added.get() + 1))
        .removed(|_| removed.set(removed.get() + 1))
        .updated(|_, _| updated.set(updated.get() + 1));

    let result = morph(&mut doc, root, html, options).expect("morph");

    assert_eq!(result, root);
    assert_eq!(doc.to_html(), html);
    assert_eq!(root.descendants(&doc.arena).collect::<Vec<_>>(), before);
    assert_eq!(added.get(), 0);
    assert_eq!(removed.get(), 0);
    assert_eq!(updated.get(), before.len());
}

#[test]
fn keyed_reorder_moves_nodes() {
    common::setup();
    let (mut doc, ul) =
        live(r#"<ul><li key="a">A</li><li key="b">B</li><li key="c">C</li></ul>"#);
    let [a, b, c] = children(&doc, ul)[..] else {
        panic!("expected three items");
    };

    let churn = Cell::new(0);
    let options = MorphOptions::new()
        .added(|_| churn.set(churn.get() + 1))
        .removed(|_| churn.set(churn.get() + 1));
    morph(
        &mut doc,
        ul,
        r#"<ul><li key="c">C</li><li key="a">A</li><li key="b">B</li></ul>"#,
        options,
    )
    .expect("morph");

    assert_eq!(children(&doc, ul), vec![c, a, b]);
    assert_eq!(
        doc.to_html(),
        r#"<ul><li key="c">C</li><li key="a">A</li><li key="b">B</li></ul>"#
    );
    assert_eq!(churn.get(), 0);
}

#[test]
fn unkeyed_text_update_keeps_elements() {
    common::setup();
    let (mut doc, div) = live("<div><span>old</span></div>");
    let span = doc.first_child(div).expect("span");
    let text = doc.first_child(span).expect("text");

    morph(&mut doc, div, "<div><span>new</span></div>", MorphOptions::new()).expect("morph");

    assert_eq!(doc.first_child(div), Some(span));
    assert_eq!(doc.first_child(span), Some(text));
    assert_eq!(doc.text(text), Some("new"));
}

#[test]
fn attributes_are_synchronized() {
    common::setup();
    let (mut doc, div) = live(r#"<div a="1" b="2"></div>"#);

    morph(&mut doc, div, r#"<div b="3" c="4"></div>"#, MorphOptions::new()).expect("morph");

    assert_eq!(doc.outer_html(div), r#"<div b="3" c="4"></div>"#);
}

#[test]
fn tag_change_swaps_the_node() {
    common::setup();
    let (mut doc, section) = live(r#"<section><div key="x">d</div></section>"#);
    let div = doc.first_child(section).expect("div");

    let events = RefCell::new(Vec::new());
    let log = |what: &str, tag: Option<&str>| {
        events
            .borrow_mut()
            .push(format!("{what} {}", tag.unwrap_or("#text")));
    };
    let options = MorphOptions::new()
        .removing(|node, _| log("removing", node.tag()))
        .removed(|node| log("removed", node.tag()))
        .adding(|node, _| log("adding", node.tag()))
        .added(|node| log("added", node.tag()));

    morph(
        &mut doc,
        section,
        r#"<section><span key="x">s</span></section>"#,
        options,
    )
    .expect("morph");

    assert_eq!(
        events.into_inner(),
        vec!["removing div", "adding span", "removed div", "added span"]
    );
    assert_eq!(doc.to_html(), r#"<section><span key="x">s</span></section>"#);
    assert!(!doc.contains(div));
}

#[test]
fn removing_veto_keeps_the_node() {
    common::setup();
    let (mut doc, ul) = live(r#"<ul><li>a</li><li class="keep">b</li></ul>"#);
    let keep = children(&doc, ul)[1];

    let removed = Cell::new(0);
    let options = MorphOptions::new()
        .removing(|node, skip| {
            if node.attr("class") == Some("keep") {
                skip.skip();
            }
        })
        .removed(|_| removed.set(removed.get() + 1));
    morph(&mut doc, ul, "<ul><li>a</li></ul>", options).expect("morph");

    assert_eq!(doc.to_html(), r#"<ul><li>a</li><li class="keep">b</li></ul>"#);
    assert_eq!(children(&doc, ul)[1], keep);
    assert_eq!(removed.get(), 0);
}

#[test]
fn removing_veto_blocks_a_swap() {
    common::setup();
    let (mut doc, section) = live("<section><div>leaving</div></section>");
    let div = doc.first_child(section).expect("div");

    let options = MorphOptions::new().removing(|_, skip| skip.skip());
    morph(&mut doc, section, "<section><p>entering</p></section>", options).expect("morph");

    assert_eq!(doc.first_child(section), Some(div));
    assert_eq!(doc.to_html(), "<section><div>leaving</div></section>");
}

#[test]
fn adding_veto_skips_insertion() {
    common::setup();
    let (mut doc, ul) = live("<ul></ul>");

    let added = Cell::new(0);
    let options = MorphOptions::new()
        .adding(|node, skip| {
            if node.attr("class") == Some("skip") {
                skip.skip();
            }
        })
        .added(|_| added.set(added.get() + 1));
    morph(
        &mut doc,
        ul,
        r#"<ul><li>a</li><li class="skip">b</li></ul>"#,
        options,
    )
    .expect("morph");

    assert_eq!(doc.to_html(), "<ul><li>a</li></ul>");
    assert_eq!(added.get(), 1);
}

#[test]
fn surplus_live_children_are_removed() {
    common::setup();
    let (mut doc, p) = live("<p>a<b>b</b>c</p>");

    let removed = RefCell::new(Vec::new());
    let options = MorphOptions::new().removed(|node| {
        removed
            .borrow_mut()
            .push(node.text().unwrap_or_default().to_owned())
    });
    morph(&mut doc, p, "<p>x<b>b</b></p>", options).expect("morph");

    assert_eq!(doc.to_html(), "<p>x<b>b</b></p>");
    assert_eq!(removed.into_inner(), vec!["c"]);
}

#[test]
fn blocks_reconcile_in_isolation() {
    common::setup();
    let (mut doc, div) = live(concat!(
        "<div>",
        r#"<!-- __BLOCK__ --><p key="x">1</p><!-- __ENDBLOCK__ -->"#,
        r#"<!-- __BLOCK__ --><p key="y">2</p><!-- __ENDBLOCK__ -->"#,
        "</div>",
    ));
    let kids = children(&doc, div);
    let (x, y) = (kids[1], kids[4]);

    let target = concat!(
        "<div>",
        r#"<!-- __BLOCK__ --><p key="y">1</p><!-- __ENDBLOCK__ -->"#,
        r#"<!-- __BLOCK__ --><p key="x">2</p><!-- __ENDBLOCK__ -->"#,
        "</div>",
    );
    let added = Cell::new(0);
    let removed = Cell::new(0);
    let options = MorphOptions::new()
        .added(|_| added.set(added.get() + 1))
        .removed(|_| removed.set(removed.get() + 1));
    morph(&mut doc, div, target, options).expect("morph");

    assert_eq!(doc.to_html(), target);
    // Neither keyed paragraph crossed into the other region
    assert!(!doc.contains(x));
    assert!(!doc.contains(y));
    assert_eq!(added.get(), 2);
    assert_eq!(removed.get(), 2);
}

#[test]
fn nested_blocks_are_matched_by_balance() {
    common::setup();
    let (mut doc, div) = live(concat!(
        "<div>",
        "<!-- __BLOCK__ --><i>outer</i>",
        "<!-- __BLOCK__ --><b>inner</b><!-- __ENDBLOCK__ -->",
        "<!-- __ENDBLOCK__ -->",
        "<p>after</p>",
        "</div>",
    ));
    let after = doc.children(div).last().expect("p");

    let target = concat!(
        "<div>",
        "<!-- __BLOCK__ --><i>outer!</i>",
        "<!-- __BLOCK__ --><b>inner!</b><em>more</em><!-- __ENDBLOCK__ -->",
        "<!-- __ENDBLOCK__ -->",
        "<p>after</p>",
        "</div>",
    );
    morph(&mut doc, div, target, MorphOptions::new()).expect("morph");

    assert_eq!(doc.to_html(), target);
    assert_eq!(doc.children(div).last(), Some(after));
}

#[test]
fn unbalanced_block_is_an_error() {
    common::setup();
    let (mut doc, div) = live("<div><!-- __BLOCK__ --><p></p></div>");

    let err = morph(
        &mut doc,
        div,
        "<div><!-- __BLOCK__ --><p></p><!-- __ENDBLOCK__ --></div>",
        MorphOptions::new(),
    )
    .expect_err("live side has no end marker");

    assert!(matches!(err, MorphError::UnbalancedBlock { side: Side::Live }));
}

#[test]
fn lookahead_keeps_equal_siblings() {
    common::setup();
    let markup = "<div><p>x</p><p>y</p></div>";
    let target = "<div><p>new</p><p>x</p><p>y</p></div>";

    let (mut doc, div) = live(markup);
    let [x, y] = children(&doc, div)[..] else {
        panic!("expected two paragraphs");
    };
    morph(&mut doc, div, target, MorphOptions::new().lookahead(true)).expect("morph");
    assert_eq!(doc.to_html(), target);
    assert_eq!(children(&doc, div)[1..], [x, y]);

    let (mut doc, div) = live(markup);
    let x = doc.first_child(div).expect("x");
    morph(&mut doc, div, target, MorphOptions::new()).expect("morph");
    assert_eq!(doc.to_html(), target);
    // Without lookahead the first paragraph is rewritten in place
    assert_eq!(doc.first_child(div), Some(x));
}

#[test]
fn unkeyed_target_holds_over_keyed_live_node() {
    common::setup();
    let (mut doc, ul) = live(r#"<ul><li key="a">A</li><li>plain</li></ul>"#);
    let a = doc.first_child(ul).expect("a");

    let added = Cell::new(0);
    let removed = Cell::new(0);
    let options = MorphOptions::new()
        .added(|_| added.set(added.get() + 1))
        .removed(|_| removed.set(removed.get() + 1));
    morph(
        &mut doc,
        ul,
        r#"<ul><li>plain</li><li key="a">A</li></ul>"#,
        options,
    )
    .expect("morph");

    assert_eq!(doc.to_html(), r#"<ul><li>plain</li><li key="a">A</li></ul>"#);
    assert_eq!(children(&doc, ul)[1], a);
    assert_eq!(added.get(), 1);
    assert_eq!(removed.get(), 1);
}

#[test]
fn custom_key_extractor() {
    common::setup();
    let (mut doc, ul) = live(r#"<ul><li id="one">1</li><li id="two">2</li></ul>"#);
    let [one, two] = children(&doc, ul)[..] else {
        panic!("expected two items");
    };

    let options = MorphOptions::new().key(|node| node.attr("id").map(str::to_owned));
    morph(
        &mut doc,
        ul,
        r#"<ul><li id="two">2</li><li id="one">1</li></ul>"#,
        options,
    )
    .expect("morph");

    assert_eq!(children(&doc, ul), vec![two, one]);
}

#[test]
fn updating_hook_controls() {
    common::setup();
    let markup = r#"<div><p class="a">x</p></div>"#;
    let target = r#"<div><p class="b">y</p></div>"#;

    let (mut doc, div) = live(markup);
    let options = MorphOptions::new().updating(|from, _, update| {
        if from.tag() == Some("p") {
            update.skip();
        }
    });
    morph(&mut doc, div, target, options).expect("morph");
    assert_eq!(doc.to_html(), markup);

    let (mut doc, div) = live(markup);
    let options = MorphOptions::new().updating(|from, _, update| {
        if from.tag() == Some("p") {
            update.children_only();
        }
    });
    morph(&mut doc, div, target, options).expect("morph");
    assert_eq!(doc.to_html(), r#"<div><p class="a">y</p></div>"#);

    let (mut doc, div) = live(markup);
    let options = MorphOptions::new().updating(|from, _, update| {
        if from.tag() == Some("p") {
            update.skip_children();
        }
    });
    morph(&mut doc, div, target, options).expect("morph");
    assert_eq!(doc.to_html(), r#"<div><p class="b">x</p></div>"#);
}

#[test]
fn transitioning_element_keeps_attributes_but_children_follow() {
    common::setup();
    let (mut doc, div) = live(r#"<div><p class="leaving">x</p></div>"#);
    let p = doc.first_child(div).expect("p");
    doc.set_transitioning(p, true);

    morph(&mut doc, div, r#"<div><p class="gone">y</p></div>"#, MorphOptions::new())
        .expect("morph");

    assert_eq!(doc.to_html(), r#"<div><p class="leaving">y</p></div>"#);
}

#[test]
fn teleport_destination_survives_the_origin_walk() {
    common::setup();
    let mut doc = parse_fragment(r#"<div><template></template></div><aside><span>moved</span></aside>"#);
    let [div, aside] = children(&doc, doc.root)[..] else {
        panic!("expected div and aside");
    };
    let template = doc.first_child(div).expect("template");
    doc.set_teleport(template, aside);

    morph(&mut doc, div, "<div><template></template></div>", MorphOptions::new())
        .expect("morph");

    assert_eq!(doc.parent(aside), Some(doc.root));
    assert_eq!(
        doc.to_html(),
        "<div><template></template></div><aside><span>moved</span></aside>"
    );
}

#[test]
fn teleported_content_is_patched_with_its_origin() {
    common::setup();
    let html = |text: &str| {
        format!("<div><template></template></div><aside><span>{text}</span></aside>")
    };
    let pair = |doc: &Document| {
        let top = children(doc, doc.root);
        (top[0], top[1])
    };

    let mut doc = parse_fragment(&html("old"));
    let (div, aside) = pair(&doc);
    let template = doc.first_child(div).expect("template");
    doc.set_teleport(template, aside);
    let span = doc.first_child(aside).expect("span");

    let mut target = parse_fragment(&html("new"));
    let (target_div, target_aside) = pair(&target);
    let target_template = target.first_child(target_div).expect("template");
    target.set_teleport(target_template, target_aside);

    morph(&mut doc, div, (target, target_div), MorphOptions::new()).expect("morph");

    assert_eq!(doc.to_html(), html("new"));
    assert_eq!(doc.first_child(aside), Some(span));
}

#[test]
fn teleport_origin_followed_by_siblings() {
    common::setup();
    let mut doc = parse_fragment(
        "<div><template></template><p>a</p></div><aside><span>moved</span></aside>",
    );
    let [div, aside] = children(&doc, doc.root)[..] else {
        panic!("expected div and aside");
    };
    let [template, p] = children(&doc, div)[..] else {
        panic!("expected template and paragraph");
    };
    let span = doc.first_child(aside).expect("span");
    doc.set_teleport(template, aside);

    morph(
        &mut doc,
        div,
        "<div><template></template><p>b</p></div>",
        MorphOptions::new(),
    )
    .expect("morph");

    assert_eq!(
        doc.to_html(),
        "<div><template></template><p>b</p></div><aside><span>moved</span></aside>"
    );
    assert_eq!(children(&doc, div), vec![template, p]);
    assert_eq!(doc.parent(aside), Some(doc.root));
    assert_eq!(doc.first_child(aside), Some(span));
}

#[test]
fn table_row_can_be_morphed_from_markup() {
    common::setup();
    let (mut doc, table) = live("<table><tbody><tr><td>old</td></tr></tbody></table>");
    let tbody = doc.first_child(table).expect("tbody");
    let tr = doc.first_child(tbody).expect("tr");
    let td = doc.first_child(tr).expect("td");

    let root = morph(&mut doc, tr, "<tr><td>new</td></tr>", MorphOptions::new()).expect("morph");

    assert_eq!(root, tr);
    assert_eq!(doc.first_child(tr), Some(td));
    assert_eq!(doc.to_html(), "<table><tbody><tr><td>new</td></tr></tbody></table>");
}

#[test]
fn template_can_be_morphed_from_markup() {
    common::setup();
    let (mut doc, div) = live("<div><template><p>a</p></template></div>");
    let template = doc.first_child(div).expect("template");
    let p = doc.first_child(template).expect("p");

    morph(
        &mut doc,
        template,
        "<template><p>b</p></template>",
        MorphOptions::new(),
    )
    .expect("morph");

    assert_eq!(doc.first_child(template), Some(p));
    assert_eq!(doc.to_html(), "<div><template><p>b</p></template></div>");
}

#[test]
fn adding_veto_keeps_the_node_a_swap_would_replace() {
    common::setup();
    let (mut doc, section) = live("<section><div>a</div></section>");
    let div = doc.first_child(section).expect("div");

    let removed = Cell::new(0);
    let options = MorphOptions::new()
        .adding(|_, skip| skip.skip())
        .removed(|_| removed.set(removed.get() + 1));
    morph(&mut doc, section, "<section><p>b</p></section>", options).expect("morph");

    assert_eq!(doc.first_child(section), Some(div));
    assert!(doc.contains(div));
    assert_eq!(doc.to_html(), "<section><div>a</div></section>");
    assert_eq!(removed.get(), 0);
}

#[test]
fn keyed_target_pulls_live_keyed_node_in_front_of_unkeyed() {
    common::setup();
    let (mut doc, ul) = live(r#"<ul><li>plain</li><li key="a">A</li></ul>"#);
    let [plain, a] = children(&doc, ul)[..] else {
        panic!("expected two items");
    };

    let churn = Cell::new(0);
    let options = MorphOptions::new()
        .added(|_| churn.set(churn.get() + 1))
        .removed(|_| churn.set(churn.get() + 1));
    morph(
        &mut doc,
        ul,
        r#"<ul><li key="a">A</li><li>plain</li></ul>"#,
        options,
    )
    .expect("morph");

    assert_eq!(children(&doc, ul), vec![a, plain]);
    assert_eq!(doc.to_html(), r#"<ul><li key="a">A</li><li>plain</li></ul>"#);
    assert_eq!(churn.get(), 0);
}

#[test]
fn unclaimed_holdover_is_reported_removed() {
    common::setup();
    let (mut doc, ul) = live(r#"<ul><li key="a">A</li></ul>"#);
    let a = doc.first_child(ul).expect("a");

    let removing = Cell::new(0);
    let removed = RefCell::new(Vec::new());
    let options = MorphOptions::new()
        .removing(|_, _| removing.set(removing.get() + 1))
        .removed(|node| removed.borrow_mut().push(node.id()));
    morph(&mut doc, ul, "<ul><li>B</li></ul>", options).expect("morph");

    assert_eq!(doc.to_html(), "<ul><li>B</li></ul>");
    assert_eq!(removed.into_inner(), vec![a]);
    // Already detached when it was set aside, so there is nothing to veto
    assert_eq!(removing.get(), 0);
    assert!(!doc.contains(a));
}

#[derive(Default)]
struct RecordingHost {
    initialized: Vec<String>,
}

impl Host for RecordingHost {
    fn init_tree(&mut self, doc: &mut Document, node: NodeId) {
        self.initialized.push(doc.outer_html(node));
    }
}

#[test]
fn host_initializes_inserted_subtrees() {
    common::setup();
    let (mut doc, div) = live("<div><p>x</p></div>");

    let mut host = RecordingHost::default();
    morph_with_host(
        &mut doc,
        div,
        "<div><p>x</p><em>new</em></div>",
        MorphOptions::new(),
        &mut host,
    )
    .expect("morph");

    assert_eq!(host.initialized, vec!["<em>new</em>"]);
}

#[test]
fn swapped_root_inherits_ancestor_scope() {
    common::setup();
    let (mut doc, section) = live("<section><div>a</div></section>");
    let div = doc.first_child(section).expect("div");
    doc.set_scope(section, ScopeId(5));

    let root = morph(&mut doc, div, "<p>b</p>", MorphOptions::new()).expect("morph");

    assert_ne!(root, div);
    assert_eq!(doc.parent(root), Some(section));
    assert_eq!(doc.scope(root), Some(ScopeId(5)));
    assert_eq!(doc.to_html(), "<section><p>b</p></section>");
}

#[test]
fn live_state_is_seeded_before_comparison() {
    common::setup();
    let (mut doc, div) = live(r#"<div><p class="old">x</p></div>"#);
    let p = doc.first_child(div).expect("p");
    doc.set_shown(p, true);

    // The target has no visibility state of its own; without the live state
    // seeded onto it the paragraph would look mid-toggle and keep its class
    morph(&mut doc, div, r#"<div><p class="new">x</p></div>"#, MorphOptions::new())
        .expect("morph");

    assert_eq!(doc.to_html(), r#"<div><p class="new">x</p></div>"#);
}

#[test]
fn detached_root_cannot_be_swapped() {
    common::setup();
    let mut doc = Document::new();
    let orphan = doc.create_element("div");

    let err = morph(&mut doc, orphan, "<span></span>", MorphOptions::new())
        .expect_err("nowhere to put the replacement");

    assert!(matches!(err, MorphError::DetachedRoot));
}

#[test]
fn vetoed_swap_of_detached_root_is_not_an_error() {
    common::setup();
    let mut doc = Document::new();
    let orphan = doc.create_element("div");

    let options = MorphOptions::new().removing(|_, skip| skip.skip());
    let root = morph(&mut doc, orphan, "<span></span>", options).expect("vetoed swap");

    assert_eq!(root, orphan);
    assert_eq!(doc.tag(orphan), Some("div"));
}

#[test]
fn target_without_elements_is_rejected() {
    common::setup();
    let (mut doc, div) = live("<div></div>");

    let err = morph(&mut doc, div, "just text", MorphOptions::new()).expect_err("no element");

    assert!(matches!(err, MorphError::EmptyTarget));
}

#[test]
fn foreign_node_ids_are_rejected() {
    common::setup();
    let big = parse_document("<html><body><div><p><b><i>deep</i></b></p></div></body></html>");
    let foreign = big.root.descendants(&big.arena).last().expect("node");
    let mut small = Document::new();

    let err = morph(&mut small, foreign, "<div></div>", MorphOptions::new())
        .expect_err("id belongs to another arena");

    assert!(matches!(err, MorphError::UnknownNode(id) if id == foreign));
}

#[test]
fn whole_document_morph() {
    common::setup();
    let mut doc = parse_document(
        "<!DOCTYPE html><html><head><title>a</title></head><body><main><h1>Hi</h1></main></body></html>",
    );
    let root = doc.root;
    let main = doc
        .body()
        .and_then(|body| doc.first_child(body))
        .expect("main");

    let target = parse_document(
        "<!DOCTYPE html><html><head><title>b</title></head><body><main><h1>Hello</h1><p>new</p></main></body></html>",
    );
    morph(&mut doc, root, target, MorphOptions::new()).expect("morph");

    assert_eq!(doc.to_html(), "<main><h1>Hello</h1><p>new</p></main>");
    assert_eq!(doc.body().and_then(|body| doc.first_child(body)), Some(main));
}
