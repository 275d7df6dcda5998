/// 从单个数据包中提取的一个标量，附带数据包时间戳
///
/// 序列中的位置即数据包的到达顺序。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample<T> {
    pub timestamp: i128,
    pub value: T,
}

impl<T> Sample<T> {
    pub fn new(timestamp: i128, value: T) -> Self {
        Self { timestamp, value }
    }
}
