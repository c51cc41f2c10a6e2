use crate::Result;
use std::future::Future;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct CachedChart {
    commission: f64,
    image: Arc<[u8]>,
}

/// 最後に描画したコミッションチャートを 1 枚だけ持つ
///
/// 異なるコミッションで描き直すと古い画像は手放す。
#[derive(Debug, Default)]
pub struct CommissionChartCache {
    slot: Option<CachedChart>,
}

impl CommissionChartCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// キャッシュ中の画像がどのコミッションのものか
    pub fn cached_commission(&self) -> Option<f64> {
        self.slot.as_ref().map(|c| c.commission)
    }

    /// 同じコミッションならキャッシュを返し、違えば `render` で描き直す
    ///
    /// `render` が `None` (描けない) や失敗を返したときはスロットは空になる。
    pub async fn get_or_render<F, Fut>(
        &mut self,
        commission: f64,
        render: F,
    ) -> Result<Option<Arc<[u8]>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<Vec<u8>>>>,
    {
        if let Some(cached) = &self.slot
            && cached.commission == commission
        {
            return Ok(Some(Arc::clone(&cached.image)));
        }

        self.slot = None;
        let Some(image) = render().await? else {
            return Ok(None);
        };
        let image: Arc<[u8]> = image.into();
        self.slot = Some(CachedChart {
            commission,
            image: Arc::clone(&image),
        });
        Ok(Some(image))
    }
}
