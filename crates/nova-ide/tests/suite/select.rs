use nova_hir::{CompilationUnit, TypeDecl};
use nova_ide::{code_select, SelectRequest, SelectedElement};
use nova_project::{Project, Workspace};
use nova_test_utils::{extract_range, lines};
use pretty_assertions::assert_eq;

use super::fixtures::{jre, test_project, X_JAVA};

fn in_method(body: &str) -> String {
    format!(
        "package p;
public class X {{
    void foo(String str, int count, Y y, Listeners l) {{
        {body}
    }}
}}
"
    )
}

fn select_in(mut projects: Vec<Project>, owner: &str, path: &str, fixture: &str) -> String {
    let (text, range) = extract_range(fixture);
    if let Some(project) = projects.iter_mut().find(|p| p.name == owner) {
        project.files.insert(path.to_string(), text);
    }
    let ws = Workspace::new(projects);
    let request = SelectRequest::new(path, range.start).with_length(range.len());
    lines(code_select(&ws, &request))
}

fn select_java(fixture: &str) -> String {
    select_in(vec![jre(), test_project()], "Test", X_JAVA, fixture)
}

#[test]
fn locals_and_parameters() {
    assert_eq!(
        select_java(&in_method("String s = str; print(/*start*/s/*end*/);")),
        "local s"
    );
    assert_eq!(
        select_java(&in_method("print(/*start*/str/*end*/);")),
        "local str"
    );
}

#[test]
fn overloads_are_narrowed_by_argument_count() {
    assert_eq!(
        select_java(&in_method("y./*start*/run/*end*/(1, 2);")),
        "method p.Y.run(int, int)"
    );
    assert_eq!(
        select_java(&in_method("y./*start*/run/*end*/(1);")),
        "method p.Y.run(int)"
    );
}

#[test]
fn unterminated_call_selects_every_overload() {
    assert_eq!(
        select_java(&in_method("y./*start*/run/*end*/(")),
        "method p.Y.run(int)\nmethod p.Y.run(int, int)"
    );
}

#[test]
fn fields_through_instances_and_types() {
    assert_eq!(
        select_java(&in_method("int n = y./*start*/count/*end*/;")),
        "field p.Y.count"
    );
    assert_eq!(
        select_java(&in_method("int n = Y./*start*/LIMIT/*end*/;")),
        "field p.Y.LIMIT"
    );
}

#[test]
fn private_members_of_other_types_are_not_selected() {
    assert_eq!(
        select_java(&in_method("int n = y./*start*/secret/*end*/;")),
        ""
    );
}

#[test]
fn types_and_packages() {
    assert_eq!(
        select_java(&in_method("/*start*/Y/*end*/ other = y;")),
        "type p.Y"
    );
    assert_eq!(
        select_java(&in_method("Object o = new /*start*/Zone/*end*/();")),
        ""
    );
    assert_eq!(
        select_java("package p;\nimport q./*start*/Zone/*end*/;\nclass X {}"),
        "type q.Zone"
    );
    assert_eq!(
        select_java("package p;\nimport /*start*/q/*end*/.Zone;\nclass X {}"),
        "package q"
    );
}

#[test]
fn annotation_attribute_names() {
    assert_eq!(
        select_java("package p;\n@A(/*start*/value/*end*/ = 1)\npublic class X {}"),
        "attribute p.A.value"
    );
}

#[test]
fn nothing_for_unknown_names_comments_and_keywords() {
    assert_eq!(select_java(&in_method("/*start*/nothing/*end*/;")), "");
    assert_eq!(select_java(&in_method("// y./*start*/count/*end*/")), "");
    assert_eq!(select_java(&in_method("/*start*/return/*end*/;")), "");
}

#[test]
fn module_names_and_packages_in_module_info() {
    let mut foo = CompilationUnit::new("/Main/src/pack1/Foo.java", Some("pack1"));
    foo.types = vec![TypeDecl::class("Foo")];
    let own = Project::new("Main").with_unit(foo);
    let astro = Project::new("Astro")
        .with_file("/Astro/src/module-info.java", "module org.astro {}");
    let path = "/Main/src/module-info.java";

    let required = select_in(
        vec![own.clone(), astro.clone()],
        "Main",
        path,
        "module m { requires /*start*/org.astro/*end*/; }",
    );
    assert_eq!(required, "module org.astro");

    let exported = select_in(
        vec![own.clone(), astro.clone()],
        "Main",
        path,
        "module m { exports /*start*/pack1/*end*/ to org.astro; }",
    );
    assert_eq!(exported, "package pack1");

    let unknown = select_in(
        vec![own, astro],
        "Main",
        path,
        "module m { requires /*start*/org.nowhere/*end*/; }",
    );
    assert_eq!(unknown, "");
}

#[test]
fn selected_elements_serialize_with_a_kind_tag() {
    let field = SelectedElement::Field {
        owner: "p.Y".into(),
        name: "count".into(),
    };
    assert_eq!(
        serde_json::to_value(&field).unwrap(),
        serde_json::json!({ "kind": "field", "owner": "p.Y", "name": "count" })
    );
    assert_eq!(field.to_string(), "field p.Y.count");
}
