//! The fixed task instruction and the shape of the deliverable it asks for.

/// Label that precedes every year in the report ("year").
pub const YEAR_MARKER: &str = "年";

/// Label that follows every count in the report ("papers").
pub const COUNT_MARKER: &str = "論文";

const FENCE: &str = "```";

/// Six-year cs.AI agent-research analysis, rendered as an ASCII bar chart.
pub const INITIAL_PROMPT: &str = r#"タスク: cs.AI論文のAgent研究増加傾向分析（2020-2025）

目的: cs.AIカテゴリの論文(2020-2025年、各年200件)のタイトル・アブストラクトを分析し、Agent研究の増加傾向を示す

実行手順:
1. 2020年から2025年まで各年でsearch_and_filter_papersツールを呼び出し:
   - 各年のcs.AI論文を200件検索
   - Agent関連キーワードでフィルタリング実行
   - 集計結果を受け取り: {"year": 2020, "total_papers": 200, "agent_papers": 10}

2. code_executionで受け取った各年の結果からASCII棒グラフ生成:
   - numpy.histogramを使用してヒストグラムデータを作成
   - 年別Agent論文数と比率を計算
   - ASCII文字（█）を使って6年間の棒グラフを描画

最終出力形式（この形式のみ）:
```
2020年 : ███ 15論文 (7.50%)
2021年 : ████ 20論文 (10.00%)
2022年 : ██████ 30論文 (15.00%)
2023年 : ████████ 40論文 (20.00%)
2024年 : ██████████ 50論文 (25.00%)
2025年 : ████████████ 60論文 (30.00%)
```

重要:
- search_and_filter_papersツールを2020年から2025年で各1回ずつ（計6回）呼び出し
- code_executionでnumpyを活用:
  * import numpy as np
  * 各年のAgent論文数データを配列として作成
  * numpy.histogram()を使ってヒストグラムを計算
  * ヒストグラムの結果を基にASCII棒の長さを決定
- 受け取った結果でASCII棒グラフを作成
- 上記の形式のみを出力（他の説明や分析は不要）
- ASCII棒グラフは```コードブロックで囲む"#;

/// Whether a text block looks like the final report: a fenced block plus
/// both report labels.
pub fn is_report_candidate(text: &str) -> bool {
    text.contains(FENCE) && text.contains(YEAR_MARKER) && text.contains(COUNT_MARKER)
}
