// 空间索引算法模块
//
// - ordering: 包络比较器（X 最小值、Y 最小值、到查询点的距离）
// - str_load: R-tree 的 STR 批量构建
// - quadtree: 四叉树构建
// - search: 包络范围查询
// - knn: 分支限界 K-最近邻搜索
// - distance: 点到几何体的精确距离

pub mod distance;
pub mod knn;
pub mod ordering;
pub(crate) mod quadtree;
pub mod search;
pub(crate) mod str_load;
