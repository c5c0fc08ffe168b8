use nova_fuzzy::MatchOptions;
use nova_hir::{CompilationUnit, TypeDecl};
use nova_ide::{complete, CompletionRequest};
use nova_project::{Project, ProjectDependency, Workspace};
use nova_test_utils::{extract_caret, workspace_with_caret};
use nova_types::TypeSig;
use pretty_assertions::assert_eq;

use super::fixtures::{public, render};

fn module_info(project: &str) -> String {
    format!("/{project}/src/module-info.java")
}

fn module_project(name: &str, module: &str) -> Project {
    Project::new(name).with_file(module_info(name), module.to_string())
}

/// Complete at the caret of `fixture`, the module-info of `owner`.
fn complete_module_info(projects: Vec<Project>, owner: &str, fixture: &str) -> String {
    complete_module_info_with(projects, owner, fixture, MatchOptions::default())
}

fn complete_module_info_with(
    projects: Vec<Project>,
    owner: &str,
    fixture: &str,
    options: MatchOptions,
) -> String {
    let path = module_info(owner);
    let (ws, offset) = workspace_with_caret(projects, owner, &path, fixture);
    let request = CompletionRequest::new(path, offset).with_options(options);
    render(complete(&ws, &request))
}

fn pack1_types(project: &str, names: &[&str]) -> CompilationUnit {
    let mut unit = CompilationUnit::new(format!("/{project}/src/pack1/Types.java"), Some("pack1"));
    unit.types = names.iter().map(|n| public(TypeDecl::class(n))).collect();
    unit
}

#[test]
fn module_body_offers_directive_keywords() {
    let actual = complete_module_info(
        vec![Project::new("Completion9_1")],
        "Completion9_1",
        "module my.mod { <|> }",
    );
    assert_eq!(
        actual,
        "exports[KEYWORD]{exports, null, null, exports, null, 49}\n\
         opens[KEYWORD]{opens, null, null, opens, null, 49}\n\
         provides[KEYWORD]{provides, null, null, provides, null, 49}\n\
         requires[KEYWORD]{requires, null, null, requires, null, 49}\n\
         uses[KEYWORD]{uses, null, null, uses, null, 49}"
    );
}

#[test]
fn requires_offers_modules_of_dependencies() {
    let first = Project::new("Completion9_1")
        .with_dependency(ProjectDependency::module_path("Completion9_2"));
    let second = module_project("Completion9_2", "module org.eclipse.foo {}");
    let actual = complete_module_info(
        vec![first, second],
        "Completion9_1",
        "module first { requires o<|> }",
    );
    assert_eq!(
        actual,
        "org.eclipse.foo[MODULE_REF]{org.eclipse.foo, org.eclipse.foo, null, null, 49}"
    );
}

#[test]
fn requires_skips_required_and_cyclic_modules() {
    let a = Project::new("A")
        .with_dependency(ProjectDependency::module_path("B"))
        .with_dependency(ProjectDependency::module_path("C"))
        .with_dependency(ProjectDependency::module_path("D"));
    let b = module_project("B", "module b { requires a; }");
    let c = module_project("C", "module c {}");
    let d = module_project("D", "module d {}");
    let actual = complete_module_info(
        vec![a, b, c, d],
        "A",
        "module a { requires c; requires <|> }",
    );
    assert_eq!(
        actual,
        "d[MODULE_REF]{d, d, null, null, 49}\n\
         static[KEYWORD]{static, null, null, static, null, 49}\n\
         transitive[KEYWORD]{transitive, null, null, transitive, null, 49}"
    );
}

#[test]
fn requires_modifiers_are_not_repeated() {
    let actual = complete_module_info(
        vec![Project::new("A")],
        "A",
        "module a { requires transitive <|> }",
    );
    assert_eq!(actual, "static[KEYWORD]{static, null, null, static, null, 49}");
}

#[test]
fn exports_to_offers_other_modules() {
    let actual = complete_module_info(
        vec![
            Project::new("Completion9_1"),
            module_project("Greetings", "module com.greetings {}"),
            module_project("Astro", "module org.astro {}"),
        ],
        "Completion9_1",
        "module first { exports pack1 to com<|> }",
    );
    assert_eq!(
        actual,
        "com.greetings[MODULE_REF]{com.greetings, com.greetings, null, null, 49}"
    );
}

#[test]
fn exports_offers_own_packages_then_to() {
    let project = Project::new("P").with_unit(pack1_types("P", &["Foo"]));
    let packages = complete_module_info(vec![project.clone()], "P", "module p { exports pa<|> }");
    assert_eq!(
        packages,
        "pack1[PACKAGE_REF]{pack1, pack1, null, null, 49}"
    );

    let to = complete_module_info(vec![project], "P", "module p { exports pack1 <|> }");
    assert_eq!(to, "to[KEYWORD]{to, null, null, to, null, 49}");
}

#[test]
fn uses_with_mismatched_case_scores_lower() {
    let project =
        Project::new("Completion9_1").with_unit(pack1_types("Completion9_1", &["CCC", "CCC2", "CCC3"]));
    let mismatched =
        complete_module_info(vec![project.clone()], "Completion9_1", "module first { uses cc<|> }");
    assert_eq!(
        mismatched,
        "CCC[TYPE_REF]{pack1.CCC, pack1, Lpack1.CCC;, null, 39}\n\
         CCC2[TYPE_REF]{pack1.CCC2, pack1, Lpack1.CCC2;, null, 39}\n\
         CCC3[TYPE_REF]{pack1.CCC3, pack1, Lpack1.CCC3;, null, 39}"
    );

    let matched = complete_module_info(vec![project], "Completion9_1", "module first { uses CC<|> }");
    assert_eq!(
        matched,
        "CCC[TYPE_REF]{pack1.CCC, pack1, Lpack1.CCC;, null, 49}\n\
         CCC2[TYPE_REF]{pack1.CCC2, pack1, Lpack1.CCC2;, null, 49}\n\
         CCC3[TYPE_REF]{pack1.CCC3, pack1, Lpack1.CCC3;, null, 49}"
    );
}

#[test]
fn provides_with_offers_concrete_implementations() {
    let mut unit = CompilationUnit::new("/P/src/pack1/S.java", Some("pack1"));
    let mut implementation = public(TypeDecl::class("Impl"));
    implementation.interfaces.push(TypeSig::simple("S"));
    let mut abstract_impl = public(TypeDecl::class("AbstractImpl"));
    abstract_impl.modifiers.is_abstract = true;
    abstract_impl.interfaces.push(TypeSig::simple("S"));
    unit.types = vec![
        public(TypeDecl::interface("S")),
        implementation,
        abstract_impl,
        public(TypeDecl::class("Other")),
    ];
    let project = Project::new("P").with_unit(unit);

    let with = complete_module_info(vec![project.clone()], "P", "module p { provides pack1.S <|> }");
    assert_eq!(with, "with[KEYWORD]{with, null, null, with, null, 49}");

    let implementations = complete_module_info(
        vec![project],
        "P",
        "module p { provides pack1.S with pack1.<|> }",
    );
    assert_eq!(
        implementations,
        "Impl[TYPE_REF]{pack1.Impl, pack1, Lpack1.Impl;, null, 49}"
    );
}

#[test]
fn module_name_is_offered_for_valid_project_names() {
    let actual = complete_module_info(vec![Project::new("Completion9_1")], "Completion9_1", "module <|>");
    assert_eq!(
        actual,
        "Completion9_1[MODULE_DECLARATION]{Completion9_1, Completion9_1, null, null, 49}"
    );

    for invalid in ["1Bug529123", "Bug-529123", "Bug 529123"] {
        let actual = complete_module_info(vec![Project::new(invalid)], invalid, "module <|>");
        assert_eq!(actual, "", "project `{invalid}`");
    }
}

#[test]
fn module_header_keywords() {
    let actual = complete_module_info(vec![Project::new("P")], "P", "<|>");
    assert_eq!(
        actual,
        "import[KEYWORD]{import, null, null, import, null, 49}\n\
         module[KEYWORD]{module, null, null, module, null, 49}\n\
         open[KEYWORD]{open, null, null, open, null, 49}"
    );
    let actual = complete_module_info(vec![Project::new("P")], "P", "open <|>");
    assert_eq!(actual, "module[KEYWORD]{module, null, null, module, null, 49}");
}

#[test]
fn subword_reaches_inner_words_of_module_names() {
    let first = Project::new("A").with_dependency(ProjectDependency::module_path("B"));
    let second = module_project("B", "module org.eclipse.foo {}");
    let actual = complete_module_info_with(
        vec![first, second],
        "A",
        "module a { requires foo<|> }",
        MatchOptions {
            subword: true,
            ..MatchOptions::default()
        },
    );
    assert_eq!(
        actual,
        "org.eclipse.foo[MODULE_REF]{org.eclipse.foo, org.eclipse.foo, null, null, 18}"
    );
}

#[test]
fn malformed_module_info_never_panics() {
    let sources = [
        "module",
        "module {",
        "module m { requires ; exports to to ; }",
        "module m { provides with with , ; uses",
        "@Deprecated( module m { opens a.b to , c",
        "module m { requires static static transitive",
        "module m.{ exports .. }",
        "open open module m { }",
        "module m { /* unterminated",
        "module m { \"text",
        "}}}{{{",
        "",
    ];
    for source in sources {
        let ws = Workspace::new(vec![Project::new("P").with_file(module_info("P"), source)]);
        let mut offset = 0;
        while offset <= source.len() {
            let request = CompletionRequest::new(module_info("P"), offset);
            let _ = complete(&ws, &request);
            offset += 1;
        }
    }
}

#[test]
fn caret_fixture_is_stripped() {
    let (text, offset) = extract_caret("module m { <|>}");
    assert_eq!(text, "module m { }");
    assert_eq!(offset, 11);
}
