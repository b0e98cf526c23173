use dec_reflect::document::Document;
use dec_reflect::walker::{Env, WriteCx};

use crate::database::Database;
use crate::loader::DEFS_TAG;

/// Writes every live definition of `database` into one `Defs` document,
/// in registration order.
///
/// The output loads back into the same definitions. Parent chains are not
/// restored, each definition is written with its full content.
pub fn compose_defs(env: Env<'_>, database: &Database) -> Document {
    let mut cx = WriteCx::new(env);
    let root = cx.doc_mut().add_root(DEFS_TAG);

    for def in database.iter() {
        let ty = def.def_type();
        let tag = env.directory.name_or_path(&ty.id(), ty.type_path());
        let doc = cx.doc_mut();
        let node = doc.add_child(root, tag);
        doc.set_attr(node, "defName", &*def.info().name());
        def.write_node(&mut cx, node);
    }

    log::debug!("composed {} definitions", database.len());
    cx.into_document()
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use crate::fixtures::{Fixture, ItemDef, ThingDef};

    #[test]
    fn composed_defs_load_back() {
        let mut fx = Fixture::new();
        fx.load(
            r#"<Defs>
                <Base defName="Template" abstract="true"><label>lamp</label></Base>
                <Thing defName="Lamp" parent="Template"><w>4</w></Thing>
                <Item defName="Sword"><damage>3</damage><upgrade>Blade</upgrade></Item>
                <Item defName="Blade"><damage>9</damage></Item>
            </Defs>"#,
        );
        fx.assert_clean();

        let text = fx.engine.compose_defs();
        assert!(text.contains(r#"<Thing defName="Lamp">"#), "{text}");
        assert!(!text.contains("Template"), "{text}");

        let mut copy = Fixture::new();
        copy.load(&text);
        copy.assert_clean();

        let lamp = copy.engine.get::<ThingDef>("Lamp").unwrap();
        assert_eq!((lamp.borrow().base.label.as_str(), lamp.borrow().w), ("lamp", 4));
        let sword = copy.engine.get::<ItemDef>("Sword").unwrap();
        let blade = copy.engine.get::<ItemDef>("Blade").unwrap();
        assert_eq!(sword.borrow().damage, 3);
        assert_eq!(sword.borrow().upgrade.get(), Some(&blade));
        assert_eq!(copy.engine.compose_defs(), text);
    }

    #[test]
    fn deleted_defs_are_left_out() {
        let mut fx = Fixture::new();
        fx.load(r#"<Defs><Item defName="Sword" /><Item defName="Shield" /></Defs>"#);
        let sword = fx.engine.get::<ItemDef>("Sword").unwrap();
        fx.engine.database.delete(&sword).unwrap();

        let text = fx.engine.compose_defs();
        assert!(!text.contains("Sword"), "{text}");
        assert!(text.contains("Shield"), "{text}");
    }
}
