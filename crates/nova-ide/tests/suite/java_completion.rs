use nova_fuzzy::MatchOptions;
use nova_ide::{complete, CompletionRequest, ScopeHints};
use nova_types::TypeSig;
use pretty_assertions::assert_eq;

use super::fixtures::{complete_java, render, workspace, X_JAVA};

const IN_METHOD: &str = "package p;
public class X {
    void foo(String str, int count, Y y, Listeners l) {
        BODY
    }
}
";

fn in_method(body: &str) -> String {
    IN_METHOD.replace("BODY", body)
}

fn expecting(ty: &str) -> impl FnOnce(CompletionRequest) -> CompletionRequest {
    let hints = ScopeHints {
        expected_type: Some(TypeSig::simple(ty)),
        ..ScopeHints::default()
    };
    move |request| request.with_hints(hints)
}

#[test]
fn locals_matching_the_expected_type_rank_first() {
    let actual = complete_java(&in_method("co<|>"), expecting("int"));
    assert_eq!(
        actual,
        "count[LOCAL_VARIABLE_REF]{count, null, I, count, null, 82}\n\
         continue[KEYWORD]{continue, null, null, continue, null, 49}"
    );
}

#[test]
fn true_and_false_win_when_boolean_is_expected() {
    let actual = complete_java(&in_method("t<|>"), expecting("boolean"));
    assert_eq!(
        actual,
        "true[KEYWORD]{true, null, null, true, null, 50}\n\
         this[KEYWORD]{this, null, null, this, null, 49}\n\
         throw[KEYWORD]{throw, null, null, throw, null, 49}\n\
         try[KEYWORD]{try, null, null, try, null, 49}\n\
         Throwable[TYPE_REF]{Throwable, java.lang, Ljava.lang.Throwable;, null, 42}"
    );
}

#[test]
fn instance_receiver_lists_accessible_members() {
    let actual = complete_java(&in_method("y.<|>"), |r| r);
    assert_eq!(
        actual,
        "count[FIELD_REF]{count, Lp.Y;, I, count, null, 62}\n\
         run[METHOD_REF]{run(), Lp.Y;, (I)V, run, (times), 62}\n\
         run[METHOD_REF]{run(), Lp.Y;, (II)V, run, (times, delay), 62}\n\
         size[METHOD_REF]{size(), Lp.Y;, ()I, size, (), 62}\n\
         LIMIT[FIELD_REF]{LIMIT, Lp.Y;, I, LIMIT, null, 51}"
    );
}

#[test]
fn type_receiver_lists_static_members_only() {
    let actual = complete_java(&in_method("Y.<|>"), |r| r);
    assert_eq!(actual, "LIMIT[FIELD_REF]{LIMIT, Lp.Y;, I, LIMIT, null, 62}");
}

#[test]
fn subword_matches_only_when_enabled() {
    let fixture = in_method("l.addlistener<|>");
    let prefix_only = complete_java(&fixture, |r| r);
    assert_eq!(
        prefix_only,
        "addListener[METHOD_REF]{addListener(), Lp.Listeners;, ()V, addListener, (), 56}"
    );

    let subword = complete_java(&fixture, |r| {
        r.with_options(MatchOptions {
            subword: true,
            ..MatchOptions::default()
        })
    });
    assert_eq!(
        subword,
        "addListener[METHOD_REF]{addListener(), Lp.Listeners;, ()V, addListener, (), 56}\n\
         addXListener[METHOD_REF]{addXListener(), Lp.Listeners;, ()V, addXListener, (), 31}\n\
         addYListener[METHOD_REF]{addYListener(), Lp.Listeners;, ()V, addYListener, (), 31}"
    );
}

#[test]
fn extends_prefers_classes_and_implements_interfaces() {
    let extends = complete_java("package p;\npublic class X extends R<|>", |r| r);
    assert_eq!(
        extends,
        "RuntimeException[TYPE_REF]{RuntimeException, java.lang, Ljava.lang.RuntimeException;, null, 72}"
    );

    let implements = complete_java("package p;\npublic class X implements R<|>", |r| r);
    assert_eq!(
        implements,
        "Runnable[TYPE_REF]{Runnable, java.lang, Ljava.lang.Runnable;, null, 72}"
    );
}

#[test]
fn catch_offers_throwables() {
    let actual = complete_java(&in_method("try { } catch (E<|>"), |r| r);
    assert_eq!(
        actual,
        "Exception[TYPE_REF]{Exception, java.lang, Ljava.lang.Exception;, null, 72}"
    );
}

#[test]
fn annotation_offers_annotation_types() {
    let actual = complete_java("package p;\npublic class X {\n    @D<|>\n}", |r| r);
    assert_eq!(
        actual,
        "Deprecated[TYPE_REF]{Deprecated, java.lang, Ljava.lang.Deprecated;, null, 72}"
    );
}

#[test]
fn types_outside_the_scope_are_inserted_qualified() {
    let actual = complete_java(&in_method("Zo<|>"), |r| r);
    assert_eq!(actual, "Zone[TYPE_REF]{q.Zone, q, Lq.Zone;, null, 51}");
}

#[test]
fn import_uses_the_whole_dotted_prefix() {
    let packages = complete_java("package p;\nimport ja<|>", |r| r);
    assert_eq!(
        packages,
        "java.lang[PACKAGE_REF]{java.lang, java.lang, null, null, 49}"
    );

    let types = complete_java("package p;\nimport java.lang.R<|>", |r| r);
    assert_eq!(
        types,
        "Runnable[TYPE_REF]{java.lang.Runnable, java.lang, Ljava.lang.Runnable;, null, 49}\n\
         RuntimeException[TYPE_REF]{java.lang.RuntimeException, java.lang, Ljava.lang.RuntimeException;, null, 49}"
    );
}

#[test]
fn nothing_inside_comments_and_strings() {
    assert_eq!(complete_java(&in_method("// y.<|>"), |r| r), "");
    assert_eq!(complete_java(&in_method("String s = \"y.<|>"), |r| r), "");
}

#[test]
fn max_results_truncates_after_ranking() {
    let actual = complete_java(&in_method("y.<|>"), |r| r.with_max_results(2));
    assert_eq!(
        actual,
        "count[FIELD_REF]{count, Lp.Y;, I, count, null, 62}\n\
         run[METHOD_REF]{run(), Lp.Y;, (I)V, run, (times), 62}"
    );
}

#[test]
fn replace_range_covers_the_typed_prefix() {
    let (ws, offset) = workspace(&in_method("y.cou<|>"));
    let proposals = complete(&ws, &CompletionRequest::new(X_JAVA, offset));
    assert_eq!(proposals.len(), 1);
    let range = proposals[0].replace_range;
    assert_eq!(usize::from(range.end()), offset);
    assert_eq!(usize::from(range.start()), offset - "cou".len());
}

#[test]
fn completing_twice_is_identical() {
    let (ws, offset) = workspace(&in_method("<|>"));
    let request = CompletionRequest::new(X_JAVA, offset);
    let first = render(complete(&ws, &request));
    let second = render(complete(&ws, &request));
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn unknown_paths_yield_nothing() {
    let (ws, offset) = workspace(&in_method("<|>"));
    let request = CompletionRequest::new("/Nowhere/X.java", offset);
    assert!(complete(&ws, &request).is_empty());
}
