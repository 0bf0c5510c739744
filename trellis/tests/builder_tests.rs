use facet_testhelpers::test;
use trellis::{Args, Document, Error, Flavor, Serializer, Standard, Strict, VoidAware};

#[test]
fn test_table_scenario() {
    let h = Document::html();
    {
        let _table = h.tag("table").enter();
        {
            let _tr = h.tag("tr").enter();
            h.tag("td").content("cell 1");
        }
        {
            let _tr = h.tag("tr").enter();
            h.tag("td").content("cell 2");
        }
    }

    assert_eq!(
        h.render(),
        "<table>\n<tr><td>cell 1</td></tr>\n<tr><td>cell 2</td></tr>\n</table>"
    );
    assert_eq!(h.depth(), 0);
}

#[test]
fn test_img_scenario() {
    let h = Document::xhtml();
    h.tag("img").attr("src", "a.png");

    assert_eq!(VoidAware.serialize(&h), r#"<img src="a.png" />"#);
    assert_eq!(Standard.serialize(&h), r#"<img src="a.png"></img>"#);
}

#[test]
fn test_creation_goes_to_attach_point_not_receiver() {
    let h = Document::html().with_newlines(false);
    let p = h.tag("p");
    let div = h.tag("div");

    div.with(|_| {
        // Requested through `p`, but `div` is the open scope.
        p.tag("span").content("inside div");
        p.text("also inside div");
    });

    assert_eq!(
        h.render(),
        "<p></p><div><span>inside div</span>also inside div</div>"
    );
}

#[test]
fn test_children_follow_creation_order() {
    let h = Document::xml();
    let list = h.tag("list");
    {
        let _scope = list.enter();
        for i in 0..3 {
            h.tag("item").content(&i.to_string());
            if i == 1 {
                let _nested = h.tag("group").enter();
                h.tag("item").content("nested");
            }
        }
    }

    assert_eq!(
        h.render(),
        "<list><item>0</item><item>1</item><group><item>nested</item></group><item>2</item></list>"
    );
}

#[test]
fn test_with_returns_closure_value() {
    let h = Document::html();
    let depth = h.tag("ol").with(|_| h.depth());
    assert_eq!(depth, 1);
    assert_eq!(h.depth(), 0);
}

#[test]
fn test_scope_derefs_to_tag() {
    let h = Document::html();
    let ul = h.tag("ul").enter();
    ul.tag("li").content("one");
    let name = ul.name();
    drop(ul);

    assert_eq!(name, "ul");
    assert_eq!(h.render(), "<ul>\n<li>one</li>\n</ul>");
}

#[test]
fn test_newline_appends_line_break() {
    let h = Document::html().with_newlines(false);
    h.tag("p").with(|_| {
        h.text("first");
        h.newline();
        h.text("second");
    });
    assert_eq!(h.render(), "<p>first\nsecond</p>");
}

#[test]
fn test_text_with_escape_flag() {
    let h = Document::html().with_newlines(false);
    h.text_with("<b>", true);
    h.text_with("<b>", false);
    assert_eq!(h.render(), "&lt;b&gt;<b>");
}

#[test]
fn test_append_detached_element() {
    let h = Document::html().with_newlines(false);
    let name = "h2";
    let heading = h.element(name).content("Dynamic");

    h.tag("section").with(|_| h.append(heading)).unwrap();
    h.append_str("<hr>");

    assert_eq!(h.render(), "<section><h2>Dynamic</h2></section><hr>");
}

#[test]
fn test_append_moves_existing_element() {
    let h = Document::html().with_newlines(false);
    let b = h.tag("b").content("moved");
    h.tag("p").with(|_| h.append(b)).unwrap();
    assert_eq!(h.render(), "<p><b>moved</b></p>");
}

#[test]
fn test_append_document() {
    let fragment = Document::html();
    fragment.tag("li").content("a");
    fragment.tag("li").content("b");

    let h = Document::html();
    h.tag("ul").with(|_| h.append_document(&fragment));

    assert_eq!(h.render(), "<ul>\n<li>a</li>\n<li>b</li>\n</ul>");
}

#[test]
fn test_attribute_overwrite_keeps_position() {
    let h = Document::html();
    h.tag("a")
        .attr("href", "/one")
        .attr("id", "link")
        .attr("href", "/two");
    assert_eq!(h.render(), r#"<a href="/two" id="link"></a>"#);
}

#[test]
fn test_attribute_quotes_are_escaped() {
    let h = Document::html();
    h.tag("abbr").attr("title", "say \"hi\"").content("hi");
    assert_eq!(
        h.render(),
        r#"<abbr title="say &quot;hi&quot;">hi</abbr>"#
    );
}

#[test]
fn test_call_configures_everything() {
    let h = Document::html();
    h.tag("td")
        .call(
            Args::new()
                .args(["a", "b"])
                .attr("class_", "wide")
                .attr("colspan", "2")
                .flag("nowrap")
                .newlines(true),
        )
        .unwrap();

    assert_eq!(
        h.render(),
        "<td class=\"wide\" colspan=\"2\" nowrap>\na\nb\n</td>"
    );
}

#[test]
fn test_read_misuse() {
    let h = Document::html();
    let read = h.tag("read");

    let err = read.call(Args::new().arg(10)).unwrap_err();
    assert!(matches!(err, Error::ReadMisuse { .. }));

    let err = read.call(Args::new().attr("id", "x")).unwrap_err();
    assert!(matches!(err, Error::ReadMisuse { .. }));

    // Nothing was configured by the rejected calls.
    assert_eq!(h.render(), "<read></read>");
}

#[test]
fn test_empty_element_per_flavor() {
    for (flavor, expected) in [
        (Flavor::Html, "<x></x>"),
        (Flavor::Xhtml, "<x></x>"),
        (Flavor::Xml, "<x />"),
    ] {
        let h = Document::new(flavor);
        h.tag("x");
        assert_eq!(h.render(), expected, "{flavor:?}");
    }

    let h = Document::xhtml();
    h.tag("hr");
    assert_eq!(h.render(), "<hr />");
    assert_eq!(Strict.serialize(&h), "<hr />");
}
