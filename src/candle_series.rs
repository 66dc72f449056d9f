use crate::model::Candle;

/// 분석용 캔들 시계열
///
/// 한 번의 분석 호출에 사용되는 고정된 캔들 윈도우입니다.
/// 데이터는 timestamp 기준 오름차순(가장 오래된 캔들이 먼저)으로 정렬되며
/// 동일한 timestamp의 캔들은 마지막에 들어온 값 하나만 유지됩니다.
/// 생성 이후에는 변경되지 않습니다.
#[derive(Debug, Clone)]
pub struct CandleSeries<C: Candle> {
    items: Vec<C>,
}

impl<C> CandleSeries<C>
where
    C: Candle,
{
    /// 새로운 캔들 시계열을 생성합니다.
    ///
    /// # Arguments
    /// * `items` - 정렬되지 않았을 수도 있는 캔들 목록
    ///
    /// # Returns
    /// * `CandleSeries<C>` - 오름차순으로 정렬되고 중복이 제거된 시계열
    pub fn new(mut items: Vec<C>) -> CandleSeries<C> {
        // 안정 정렬이므로 같은 timestamp 안에서는 입력 순서가 유지됨
        items.sort_by_key(|candle| candle.timestamp());

        let mut deduped: Vec<C> = Vec::with_capacity(items.len());
        for candle in items {
            match deduped.last_mut() {
                Some(last) if last.timestamp() == candle.timestamp() => {
                    log::trace!("중복 캔들 교체: {}", candle.timestamp());
                    *last = candle;
                }
                _ => deduped.push(candle),
            }
        }

        CandleSeries { items: deduped }
    }

    /// 캔들 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// 시계열이 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 전체 캔들 슬라이스 (오름차순)
    pub fn items(&self) -> &[C] {
        &self.items
    }

    /// 가장 최근 캔들
    pub fn last(&self) -> Option<&C> {
        self.items.last()
    }

    /// 최근 `n`개의 캔들 (오름차순 유지)
    ///
    /// # Arguments
    /// * `n` - 가져올 캔들 수. 전체 길이보다 크면 전체를 반환합니다.
    pub fn tail(&self, n: usize) -> &[C] {
        let start = self.items.len().saturating_sub(n);
        &self.items[start..]
    }

    /// 종가 목록
    pub fn closes(&self) -> Vec<f64> {
        self.items.iter().map(|candle| candle.close_price()).collect()
    }

    /// 최근 종가
    pub fn last_close(&self) -> Option<f64> {
        self.last().map(|candle| candle.close_price())
    }

    /// 최근 `n`개 캔들의 종가가 연속으로 상승했는지 확인합니다.
    pub fn is_rise(&self, n: usize) -> bool {
        let window = self.tail(n);
        window.len() >= 2
            && window
                .windows(2)
                .all(|pair| pair[1].close_price() > pair[0].close_price())
    }

    /// 최근 `n`개 캔들의 종가가 연속으로 하락했는지 확인합니다.
    pub fn is_fall(&self, n: usize) -> bool {
        let window = self.tail(n);
        window.len() >= 2
            && window
                .windows(2)
                .all(|pair| pair[1].close_price() < pair[0].close_price())
    }
}

impl<C: Candle> From<Vec<C>> for CandleSeries<C> {
    fn from(items: Vec<C>) -> Self {
        CandleSeries::new(items)
    }
}
