//! Projects shared by the completion and select suites.

use nova_core::{Modifiers, Visibility};
use nova_hir::{CompilationUnit, FieldDecl, MethodDecl, TypeDecl, TypeKind};
use nova_ide::{complete, CompletionRequest, Proposal};
use nova_project::{Project, ProjectKind, Workspace};
use nova_test_utils::{lines, workspace_with_caret};
use nova_types::TypeSig;

pub fn public(mut ty: TypeDecl) -> TypeDecl {
    ty.modifiers = Modifiers::PUBLIC;
    ty
}

pub fn field(name: &str, ty: &str, visibility: Visibility, is_static: bool) -> FieldDecl {
    let mut field = FieldDecl::new(name, TypeSig::simple(ty));
    field.modifiers = Modifiers::with_visibility(visibility);
    field.modifiers.is_static = is_static;
    field
}

pub fn method(name: &str, ret: &str, params: &[(&str, &str)]) -> MethodDecl {
    let mut method = MethodDecl::new(name, TypeSig::simple(ret));
    method.modifiers = Modifiers::PUBLIC;
    for (param, ty) in params {
        method = method.with_param(param, TypeSig::simple(*ty));
    }
    method
}

/// A small `java.lang` on every build path.
pub fn jre() -> Project {
    let mut lang = CompilationUnit::new("/JRE/java/lang/Lang.java", Some("java.lang"));
    let mut exception = public(TypeDecl::class("Exception"));
    exception.superclass = Some(TypeSig::simple("Throwable"));
    let mut runtime = public(TypeDecl::class("RuntimeException"));
    runtime.superclass = Some(TypeSig::simple("Exception"));
    let mut string = public(TypeDecl::class("String"));
    string.modifiers.is_final = true;
    lang.types = vec![
        public(TypeDecl::class("Object")),
        string,
        public(TypeDecl::class("Throwable")),
        exception,
        runtime,
        public(TypeDecl::interface("Runnable")),
        public(TypeDecl::new("Deprecated", TypeKind::Annotation)),
    ];
    Project::new("JRE")
        .with_kind(ProjectKind::System)
        .with_unit(lang)
}

/// Package `p` with a class `Y` carrying members of every visibility.
pub fn y_unit() -> CompilationUnit {
    let mut unit = CompilationUnit::new("/Test/src/p/Y.java", Some("p"));
    let mut y = public(TypeDecl::class("Y"));
    y.fields = vec![
        field("count", "int", Visibility::Public, false),
        field("LIMIT", "int", Visibility::Public, true),
        field("secret", "int", Visibility::Private, false),
    ];
    y.methods = vec![
        method("run", "void", &[("times", "int")]),
        method("run", "void", &[("times", "int"), ("delay", "int")]),
        method("size", "int", &[]),
    ];
    let mut a = public(TypeDecl::new("A", TypeKind::Annotation));
    a.methods = vec![method("value", "int", &[]), method("name", "String", &[])];
    let mut listeners = public(TypeDecl::class("Listeners"));
    listeners.methods = vec![
        method("addListener", "void", &[]),
        method("addXListener", "void", &[]),
        method("addYListener", "void", &[]),
    ];
    unit.types = vec![y, a, listeners];
    unit
}

/// Package `q`, never imported by the fixtures.
pub fn q_unit() -> CompilationUnit {
    let mut unit = CompilationUnit::new("/Test/src/q/Zone.java", Some("q"));
    unit.types = vec![public(TypeDecl::class("Zone"))];
    unit
}

pub fn test_project() -> Project {
    Project::new("Test").with_unit(y_unit()).with_unit(q_unit())
}

pub const X_JAVA: &str = "/Test/src/p/X.java";

pub fn workspace(fixture: &str) -> (Workspace, usize) {
    workspace_with_caret(vec![jre(), test_project()], "Test", X_JAVA, fixture)
}

pub fn render(proposals: Vec<Proposal>) -> String {
    lines(proposals)
}

/// Complete at the caret of `fixture`, placed at `p/X.java` of the test project.
pub fn complete_java(fixture: &str, request: impl FnOnce(CompletionRequest) -> CompletionRequest) -> String {
    let (ws, offset) = workspace(fixture);
    let request = request(CompletionRequest::new(X_JAVA, offset));
    render(complete(&ws, &request))
}
