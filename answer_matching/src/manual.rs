/*!

This is the long-form manual for `answer_matching` and `gsmark`.

## How answers are read

Survey answer options are free text. Numbers are read out of them with the
following rules:

* a plain number is a point value: `"1"`, `"1.1"`, `"-3"`
* two numbers separated by a dash are an inclusive range: `"30-40%"`, `"1-1.1"`,
  `"10–20%"` with an en-dash
* commas are only read as thousands separators (`"1,000"`); `"1,5"` is not a
  number
* otherwise, the first number in the text is used, ignoring currencies and
  units: `"$14 billion"` and `"14 pounds"` are both `14`. `"Between 300 and 700"`
  is `300`: only hyphenated ranges are understood as ranges.
* anything else (`"Yes"`, `"Don't know"`, empty cells) has no numerical value

## When is an answer correct

An answer option is correct when it matches the factual answer of the question:

* the texts are the same once transliterated to Latin letters, lower-cased
  and stripped of punctuation noise (`"1% "` is the same as `"1%"`, `"Да"` as
  `"da"`)
* or both carry the same single number (`"14"` and `"14 pounds"`)
* or the option is a range containing the factual number, bounds included
  (`"30-40%"` contains `"30%"`, `"34%"` and `"40%"`)

## When is an answer very wrong

If the question provides a very wrong answer, only that answer is very wrong.

Otherwise, when all the options are numerical, the options are sorted by their
smallest number and the answer is very wrong if it is at least 2 positions away
from the nearest correct option. With the options `1` to `7` and `1` as the
correct answer, `2` is wrong and `3` to `7` are very wrong. The positions are
counted regardless of the gaps between the numbers: `"43%"` is 2 positions away
from `"3%"` in `["3%", "23%", "43%"]`.

## `gsmark` configuration

`gsmark` reads a JSON configuration:

```json
{
  "outputSettings": { "name": "Batch 12", "outputPath": "marks.json" },
  "answerSources": [
    {
      "provider": "xlsx",
      "filePath": "answers.xlsx",
      "questionIdColumnIndex": "A",
      "answerColumnIndex": 2,
      "firstRowIndex": 2,
      "excelWorksheetName": "Sheet1"
    }
  ],
  "questions": [
    { "questionId": "q1", "correctAnswer": "34%" },
    { "questionId": "q2", "correctAnswer": "Increased", "veryWrongAnswer": "Decreased a lot" }
  ],
  "rules": { "veryWrongDistance": 2, "inferVeryWrong": true }
}
```

Column indexes start at 1 and may also be written as Excel column letters.
`provider` is `csv` or `xlsx`. Every row of a source is one answer option of a
question; all the rows sharing a question id make up the option list of that
question.

The output lists, for every row, either the correctness code (`1` correct, `2`
wrong, `3` very wrong) or the reason it could not be marked.
*/
