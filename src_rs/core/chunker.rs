// 목적:
// - 문서 본문을 적재 단위(청크)로 자른다.
//
// 설명:
// - 파싱/구조 인식 청킹은 외부 협력자 몫이며 DocumentChunker 트레이트로 주입한다.
// - 기본 구현은 문자 기준 고정 창(size)과 겹침(overlap)을 사용한다.
//
// 디자인 패턴:
// - 전략(Strategy).
//
// 참조:
// - src_rs/core/ingestion_pipeline.rs

use crate::core::config::IngestionConfig;

pub trait DocumentChunker: Send + Sync {
    fn chunk(&self, text: &str) -> Vec<String>;
}

#[derive(Debug, Clone, Copy)]
pub struct FixedWindowChunker {
    size: usize,
    overlap: usize,
}

impl FixedWindowChunker {
    /// `overlap`은 `size`보다 작아야 한다. 설정 검증을 통과한 값만 전달된다.
    pub fn new(size: usize, overlap: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            overlap: overlap.min(size - 1),
        }
    }

    pub fn from_config(config: &IngestionConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }
}

impl DocumentChunker for FixedWindowChunker {
    fn chunk(&self, text: &str) -> Vec<String> {
        let chars = text.chars().collect::<Vec<_>>();
        let step = self.size - self.overlap;

        (0..chars.len())
            .step_by(step)
            .map(|start| {
                let end = (start + self.size).min(chars.len());
                chars[start..end].iter().collect::<String>()
            })
            .filter(|chunk| !chunk.trim().is_empty())
            .collect()
    }
}
