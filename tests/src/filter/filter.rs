#[cfg(test)]
mod filter_tests {
    use app_overview_filter::{FilterOptions, filter};
    use app_overview_tree::{
        builder::TreeBuilder,
        hasher::content_hash,
        nodes::{HookDefinition, PluginNode, RouteDefinition, RouteNode},
    };
    use serde_json::json;

    use crate::utils::{decorated_tree, routes_tree, skip_to_filter_gets};

    fn keys(value: &serde_json::Value) -> Vec<&str> {
        value.as_object().unwrap().keys().map(String::as_str).collect()
    }

    fn method_and_url(routes: &[RouteNode]) -> Vec<(&str, &str)> {
        routes
            .iter()
            .map(|route| (route.method.as_str(), route.url.as_str()))
            .collect()
    }

    #[test]
    fn test_no_options_is_identity() -> anyhow::Result<()> {
        for tree in [routes_tree()?, decorated_tree()?] {
            let options = FilterOptions::new();
            assert!(options.is_noop());
            assert_eq!(filter(&tree, &options), *tree);
        }
        Ok(())
    }

    #[test]
    fn test_bare_root_collapses_to_id_and_name() {
        let root = PluginNode::new(1, "root");
        let filtered = filter(&root, &FilterOptions::new().hide_empty(true));
        assert_eq!(
            serde_json::to_value(&filtered).unwrap(),
            json!({ "id": 1, "name": "root" })
        );
    }

    #[test]
    fn test_hide_empty_prunes_every_level() -> anyhow::Result<()> {
        let tree = decorated_tree()?;
        let filtered = filter(&tree, &FilterOptions::new().hide_empty(true));
        let value = serde_json::to_value(&filtered)?;

        assert_eq!(
            value["decorators"],
            json!({
                "decorate": [{ "name": "emptyObject" }, { "name": "emptyArray" }],
                "decorateRequest": [{ "name": "oneReqDecor" }]
            })
        );
        assert_eq!(
            value["hooks"],
            json!({
                "onRequest": [{ "name": "hook1", "hash": content_hash("function hook1 () {}") }],
                "preParsing": [{ "name": "hook2", "hash": content_hash("function hook2 () {}") }],
                "onError": [{ "name": "hookSix", "hash": content_hash("function hookSix () {}") }]
            })
        );
        assert!(value.get("routes").is_none());

        let children = value["children"].as_array().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(keys(&children[0]), ["id", "name"]);
        assert_eq!(children[0]["name"], "function (instance, opts, next) { next() }");

        assert_eq!(keys(&children[1]), ["id", "name", "children"]);
        assert_eq!(
            children[1]["children"][0]["decorators"],
            json!({ "decorateReply": [{ "name": "oneRep" }] })
        );
        Ok(())
    }

    #[test]
    fn test_hide_empty_never_drops_nodes() -> anyhow::Result<()> {
        let tree = decorated_tree()?;
        let filtered = filter(&tree, &FilterOptions::new().hide_empty(true));
        let before: Vec<(u32, &str)> = tree.descendants().map(|n| (n.id, n.name.as_str())).collect();
        let after: Vec<(u32, &str)> = filtered
            .descendants()
            .map(|n| (n.id, n.name.as_str()))
            .collect();
        assert_eq!(before, after);
        Ok(())
    }

    #[test]
    fn test_filter_routes_with_hide() -> anyhow::Result<()> {
        let tree = routes_tree()?;
        let root = filter(
            &tree,
            &FilterOptions::new()
                .hide_empty(true)
                .routes_filter(&skip_to_filter_gets),
        );

        assert_eq!(
            method_and_url(root.routes()),
            [("GET", "/get"), ("GET", "/route-get"), ("POST", "/try-to-filter-post")]
        );
        assert!(root.routes().iter().all(|route| route.hooks.is_none()));
        assert_eq!(
            serde_json::to_value(&root.routes()[0])?,
            json!({ "method": "GET", "url": "/get", "prefix": "" })
        );

        let plugin = serde_json::to_value(&root.children()[0])?;
        assert_eq!(keys(&plugin), ["id", "name", "children"], "should not have routes key");

        let inner = &root.children()[0].children()[0];
        assert_eq!(method_and_url(inner.routes()), [("GET", "/not-filter")]);
        Ok(())
    }

    #[test]
    fn test_filter_routes_without_hide() -> anyhow::Result<()> {
        let tree = routes_tree()?;
        let root = filter(
            &tree,
            &FilterOptions::new().routes_filter(&skip_to_filter_gets),
        );

        assert_eq!(root.routes().len(), 3);
        let route_hooks = root.routes()[0].hooks.as_ref().unwrap();
        assert_eq!(route_hooks.len(), 10);
        assert!(route_hooks.values().all(Vec::is_empty));

        let plugin = &root.children()[0];
        assert_eq!(plugin.routes, Some(vec![]));
        assert_eq!(plugin.children()[0].routes().len(), 1);
        assert!(plugin.decorators.is_some());
        Ok(())
    }

    #[test]
    fn test_every_route_kept_at_every_depth() -> anyhow::Result<()> {
        let tree = routes_tree()?;
        let root = filter(&tree, &FilterOptions::new().routes_filter(&skip_to_filter_gets));
        let kept: Vec<(&str, &str)> = root
            .descendants()
            .flat_map(|node| method_and_url(node.routes()))
            .collect();
        assert_eq!(
            kept,
            [
                ("GET", "/get"),
                ("GET", "/route-get"),
                ("POST", "/try-to-filter-post"),
                ("GET", "/not-filter"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_route_hooks_pruned_per_key() -> anyhow::Result<()> {
        let mut builder = TreeBuilder::new();
        let root = builder.instance_created(None, "root", None)?;
        let route = RouteDefinition::new("GET", "/secure")
            .with_hook("onRequest", HookDefinition::new("auth", "function auth () {}"));
        builder.route_added(root, route, None)?;
        builder.finalize(root)?;

        let snapshot = builder.snapshot()?;
        let filtered = filter(&snapshot, &FilterOptions::new().hide_empty(true));
        let value = serde_json::to_value(&filtered.routes()[0])?;
        assert_eq!(
            value["hooks"],
            json!({ "onRequest": [{ "name": "auth", "hash": content_hash("function auth () {}") }] })
        );
        Ok(())
    }

    #[test]
    fn test_input_is_left_untouched() -> anyhow::Result<()> {
        let tree = decorated_tree()?;
        let copy = (*tree).clone();
        let reject_all = |_: &RouteNode| false;
        let _ = filter(&tree, &FilterOptions::new().hide_empty(true).routes_filter(&reject_all));
        assert_eq!(*tree, copy);
        Ok(())
    }

    #[test]
    fn test_filtering_is_stable() -> anyhow::Result<()> {
        let tree = routes_tree()?;
        let keep = skip_to_filter_gets;
        let options = FilterOptions::new().hide_empty(true).routes_filter(&keep);
        let once = filter(&tree, &options);
        let twice = filter(&once, &options);
        assert_eq!(once, twice);
        Ok(())
    }
}
