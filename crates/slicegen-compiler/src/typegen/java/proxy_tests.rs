use indoc::indoc;

use crate::Config;
use crate::test_utils::{EDGE_MODEL, SHOP_MODEL, file, generate_json, indented, section};

fn shop(path: &str) -> String {
    let generation = generate_json(SHOP_MODEL, &Config::new());
    file(&generation, &format!("com/acme/Shop/{path}")).to_string()
}

fn edge(path: &str) -> String {
    let generation = generate_json(EDGE_MODEL, &Config::new());
    file(&generation, &format!("Edge/{path}")).to_string()
}

#[test]
fn proxy_hierarchy() {
    assert!(shop("CatalogPrx.java").contains("public interface CatalogPrx extends com.zeroc.Ice.ObjectPrx"));
    assert!(shop("AdminPrx.java").contains("public interface AdminPrx extends CatalogPrx"));
    assert!(shop("CartPrx.java").contains("public interface CartPrx extends com.zeroc.Ice.ObjectPrx"));

    let implementation = shop("_AdminPrxI.java");
    assert!(implementation.ends_with(indoc! {"
        public class _AdminPrxI extends com.zeroc.Ice._ObjectPrxI implements AdminPrx
        {
            public static final long serialVersionUID = 0L;
        }
    "}));
}

#[test]
fn synchronous_call_rethrows_declared_exceptions() {
    let catalog = shop("CatalogPrx.java");

    assert!(catalog.contains(&indented(indoc! {"
        default Item find(String id) throws NotFound
        {
            return find(id, com.zeroc.Ice.ObjectPrx.noExplicitContext);
        }

        default Item find(String id, java.util.Map<String, String> context) throws NotFound
        {
            try
            {
                return _iceI_findAsync(id, context, true).waitForResponseOrUserEx();
            }
            catch(NotFound ex)
            {
                throw ex;
            }
            catch(com.zeroc.Ice.UserException ex)
            {
                throw new com.zeroc.Ice.UnknownUserException(ex.ice_id(), ex);
            }
        }
    "})));
    assert!(catalog.contains(&indented(indoc! {"
        static final Class<?>[] _iceE_find =
        {
            NotFound.class
        };
    "})));
}

#[test]
fn invocation_marshals_inputs_and_outputs() {
    let catalog = shop("CatalogPrx.java");

    assert!(catalog.contains(&indented(indoc! {r#"
        default com.zeroc.IceInternal.OutgoingAsync<Item> _iceI_findAsync(String iceP_id, java.util.Map<String, String> context, boolean sync)
        {
            com.zeroc.IceInternal.OutgoingAsync<Item> f = new com.zeroc.IceInternal.OutgoingAsync<>(this, "find", com.zeroc.Ice.OperationMode.Idempotent, sync, _iceE_find);
            f.invoke(true, context, null, ostr -> {
                ostr.writeString(iceP_id);
            }, istr -> {
                Item ret = null;
                ret = Item.ice_read(istr, ret);
                return ret;
            });
            return f;
        }
    "#})));
}

#[test]
fn void_operation_without_arguments() {
    let catalog = shop("CatalogPrx.java");

    assert!(catalog.contains(&indented(indoc! {"
        @Deprecated
        default void legacy()
        {
            legacy(com.zeroc.Ice.ObjectPrx.noExplicitContext);
        }
    "})));
    assert!(catalog.contains("_iceI_legacyAsync(context, true).waitForResponse();"));
    assert!(catalog.contains("f.invoke(false, context, null, null, null);"));
}

#[test]
fn multiple_outputs_use_the_result_carrier() {
    let catalog = shop("CatalogPrx.java");

    assert!(catalog.contains("default Catalog.ListResult list()"));
    assert!(catalog.contains("default java.util.concurrent.CompletableFuture<Catalog.ListResult> listAsync()"));
    assert!(catalog.contains(&indented(&indented(&indented(indoc! {"
        Catalog.ListResult ret = new Catalog.ListResult();
        ret.read(istr);
        return ret;
    "})))));
    assert!(catalog.contains("default Catalog.SnapshotResult snapshot()"));
}

#[test]
fn class_results_are_patched_into_a_holder() {
    let catalog = shop("CatalogPrx.java");

    assert!(catalog.contains(&indented(&indented(&indented(indoc! {"
        final com.zeroc.IceInternal.Holder<Note> ret = new com.zeroc.IceInternal.Holder<>();
        istr.readValue(new com.zeroc.IceInternal.Patcher<Note>(Note.class, Note.ice_staticId(), value -> ret.value = value));
        istr.readPendingValues();
        return ret.value;
    "})))));
}

#[test]
fn tagged_parameters_get_both_mappings() {
    let catalog = shop("CatalogPrx.java");

    assert!(catalog.contains("default void attach(Note note, String memo)"));
    assert!(catalog.contains("default void attach(Note note, java.util.Optional<String> memo)"));
    assert!(catalog.contains(
        "default java.util.concurrent.CompletableFuture<java.lang.Void> attachAsync(Note note, java.util.Optional<String> memo, java.util.Map<String, String> context)"
    ));
    assert_eq!(catalog.matches("OutgoingAsync<java.lang.Void> _iceI_attachAsync(").count(), 2);
}

#[test]
fn asynchronous_dispatch_does_not_change_the_proxy() {
    let catalog = shop("CatalogPrx.java");

    assert!(catalog.contains("default Status refresh()"));
    assert!(catalog.contains("default java.util.concurrent.CompletableFuture<Status> refreshAsync()"));
}

#[test]
fn casts_and_typed_factories() {
    let catalog = shop("CatalogPrx.java");

    assert!(catalog.contains(&indented(indoc! {"
        static CatalogPrx checkedCast(com.zeroc.Ice.ObjectPrx obj, String facet, java.util.Map<String, String> context)
        {
            return com.zeroc.Ice.ObjectPrx._checkedCast(obj, facet, context, ice_staticId(), CatalogPrx.class, _CatalogPrxI.class);
        }
    "})));
    assert!(catalog.contains("return com.zeroc.Ice.ObjectPrx._uncheckedCast(obj, facet, CatalogPrx.class, _CatalogPrxI.class);"));
    assert!(catalog.contains(&indented(indoc! {"
        @Override
        default CatalogPrx ice_twoway()
        {
            return (CatalogPrx)_ice_twoway();
        }
    "})));
    assert!(catalog.contains("return (CatalogPrx)_ice_timeout(t);"));
    assert_eq!(catalog.matches("@Override").count(), 22);
    assert!(catalog.contains("return \"::Shop::Catalog\";"));
}

#[test]
fn derived_exceptions_are_caught_first() {
    let svc = edge("SvcPrx.java");

    assert!(svc.contains("default void risky() throws B, A"));
    insta::assert_snapshot!(section(&svc, "default void risky(java.util.Map<String, String> context)"), @r"
    default void risky(java.util.Map<String, String> context) throws B, A
    {
        try
        {
            _iceI_riskyAsync(context, true).waitForResponseOrUserEx();
        }
        catch(B ex)
        {
            throw ex;
        }
        catch(A ex)
        {
            throw ex;
        }
        catch(com.zeroc.Ice.UserException ex)
        {
            throw new com.zeroc.Ice.UnknownUserException(ex.ice_id(), ex);
        }
    }
    ");
    insta::assert_snapshot!(section(&svc, "_iceE_risky ="), @r"
    static final Class<?>[] _iceE_risky =
    {
        B.class,
        A.class
    };
    ");
}
