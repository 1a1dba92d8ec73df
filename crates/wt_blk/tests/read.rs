use tracing::info;
use tracing_test::traced_test;
use wt_blk::error::{ErrorKind, Result};
use wt_blk::{Blk, NameMap, ParentContext, Value};

fn varint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

struct BlockSpec {
    name_id: i64,
    params: u32,
    children: u32,
    offset: u32,
}

#[derive(Default)]
struct BodyBuilder {
    names: Vec<&'static str>,
    params: Vec<[u8; 8]>,
    blocks: Vec<BlockSpec>,
}

impl BodyBuilder {
    fn int(&mut self, name_id: u32, value: i32) -> &mut Self {
        let mut record = [0u8; 8];
        record[..3].copy_from_slice(&name_id.to_le_bytes()[..3]);
        record[3] = 0x02;
        record[4..].copy_from_slice(&value.to_le_bytes());
        self.params.push(record);
        self
    }

    fn block(&mut self, name_id: i64, params: u32, children: u32, offset: u32) -> &mut Self {
        self.blocks.push(BlockSpec {
            name_id,
            params,
            children,
            offset,
        });
        self
    }

    fn body(&self, embed_names: bool) -> Vec<u8> {
        let mut out = Vec::new();
        if embed_names && !self.names.is_empty() {
            let raw: Vec<u8> = self
                .names
                .iter()
                .flat_map(|n| n.bytes().chain(std::iter::once(0)))
                .collect();
            varint(&mut out, self.names.len() as u64);
            varint(&mut out, raw.len() as u64);
            out.extend(raw);
        } else {
            varint(&mut out, 0);
        }

        varint(&mut out, self.blocks.len() as u64);
        varint(&mut out, self.params.len() as u64);
        varint(&mut out, 0);
        for record in &self.params {
            out.extend(record);
        }
        for block in &self.blocks {
            varint(&mut out, (block.name_id + 1) as u64);
            varint(&mut out, block.params.into());
            varint(&mut out, block.children.into());
            if block.children > 0 {
                varint(&mut out, block.offset.into());
            }
        }
        out
    }
}

/// root -> [1, 2], 1 -> [3, 4], 2 -> [5], 3 -> [6, 7, 8]
fn sample_tree() -> BodyBuilder {
    let mut builder = BodyBuilder {
        names: vec!["root", "node", "leaf", "value"],
        ..Default::default()
    };

    let layout: [(i64, u32, u32, u32); 9] = [
        (0, 1, 2, 1),
        (1, 2, 2, 3),
        (1, 1, 1, 5),
        (1, 0, 3, 6),
        (2, 3, 0, 0),
        (2, 1, 0, 0),
        (2, 2, 0, 0),
        (-1, 1, 0, 0),
        (2, 0, 0, 0),
    ];

    let mut next = 0;
    for (name_id, params, children, offset) in layout {
        builder.block(name_id, params, children, offset);
        for _ in 0..params {
            builder.int(3, next);
            next += 1;
        }
    }
    builder
}

#[traced_test]
#[test]
fn children_match_flat_block_array() -> Result<()> {
    let builder = sample_tree();
    let blk = Blk::from_body("tree.blk", &builder.body(true), None)?;
    assert_eq!(blk.block_count(), builder.blocks.len());

    for (i, spec) in builder.blocks.iter().enumerate() {
        let block = blk.block(i).expect("block exists");
        info!("checking block {i}");

        assert_eq!(block.child_count(), spec.children as usize);
        for (j, child) in block.children().enumerate() {
            let expected = blk.block(spec.offset as usize + j).expect("child exists");
            assert_eq!(child, expected);
            assert_eq!(child.index(), spec.offset as usize + j);
        }
    }

    Ok(())
}

#[traced_test]
#[test]
fn params_keep_storage_order() -> Result<()> {
    let blk = Blk::from_body("tree.blk", &sample_tree().body(true), None)?;

    let owned: Vec<i64> = blk
        .blocks()
        .flat_map(|b| b.params().iter().filter_map(|p| p.value.as_i64()))
        .collect();
    assert_eq!(owned, (0..11).collect::<Vec<i64>>());

    let leaf = blk.block(4).expect("block exists");
    assert_eq!(leaf.name(), "leaf");
    assert_eq!(
        leaf.params().iter().map(|p| p.value.clone()).collect::<Vec<_>>(),
        vec![Value::Int(4), Value::Int(5), Value::Int(6)]
    );

    let unnamed = blk.block(7).expect("block exists");
    assert_eq!(unnamed.name(), "");
    assert_eq!(unnamed.id(), None);

    Ok(())
}

#[traced_test]
#[test]
fn empty_name_map_delegates_to_parent() -> Result<()> {
    let builder = sample_tree();
    let parent: NameMap = builder.names.iter().copied().collect();

    let fat = Blk::from_body("fat.blk", &builder.body(true), None)?;
    let slim = Blk::from_body("slim.blk", &builder.body(false), Some(&parent))?;

    assert!(slim.name_map().is_empty());
    assert_eq!(fat.name_map().len(), 4);
    assert_eq!(fat.root(), slim.root());
    assert_eq!(fat.to_text(), slim.to_text());

    let orphan = Blk::from_body("orphan.blk", &builder.body(false), None).unwrap_err();
    assert_eq!(orphan.kind(), ErrorKind::Lookup);

    Ok(())
}

#[traced_test]
#[test]
fn decode_dictionary_compressed_file() -> Result<()> {
    let mut builder = BodyBuilder::default();
    builder.int(0, 42);
    let body = builder.body(false);

    let dictionary = b"answer answer answer, the container dictionary".to_vec();
    let mut compressor = zstd::bulk::Compressor::with_dictionary(3, &dictionary)?;
    let mut file = vec![0x05];
    file.extend(compressor.compress(&body)?);

    let names: NameMap = ["answer"].into_iter().collect();
    let parent = ParentContext {
        name_map: &names,
        dictionary: Some(&dictionary),
    };

    let blk = Blk::decode("answer.blk", &file, Some(&parent))?;
    assert_eq!(blk.root().params().len(), 1);
    assert_eq!(blk.root().params()[0].name, "answer");
    assert_eq!(blk.root().param("answer"), Some(&Value::Int(42)));

    Ok(())
}

#[traced_test]
#[test]
fn render_deep_chain() -> Result<()> {
    const DEPTH: usize = 100_000;
    let mut builder = BodyBuilder {
        names: vec!["node", "value"],
        ..Default::default()
    };
    for i in 1..DEPTH {
        builder.block(0, 0, 1, i as u32);
    }
    builder.block(0, 1, 0, 0).int(1, 7);

    let body = builder.body(true);
    let blk = Blk::from_body("chain.blk", &body, None)?;
    assert_eq!(blk.block_count(), DEPTH);

    let text = blk.to_text();
    assert_eq!(text.trim_start(), "value:i=7\n");
    assert_eq!(text.len() - "value:i=7\n".len(), 2 * (DEPTH - 1));

    let again = Blk::from_body("chain.blk", &body, None)?;
    assert!(blk.root() == again.root());
    Ok(())
}
